use cpr_engine::actor::{Combatant, Stat, Stats};
use cpr_engine::conditions::{
    apply_exotic_effect, ConditionId, ConditionKind, ConditionSet, ExoticEffect, FatigueTier,
    LadderGroup, StressTier, WoundTier,
};
use cpr_engine::{DamageDice, Location, RulesConfig};

#[test]
fn ids_round_trip_through_strings() {
    for id in ConditionId::all() {
        let text = id.to_string();
        assert_eq!(text.parse::<ConditionId>().unwrap(), id, "{text}");
    }
    assert_eq!(
        "mortal-2".parse::<ConditionId>().unwrap(),
        ConditionId::Wound(WoundTier::Mortal2)
    );
    assert!("mortal-7".parse::<ConditionId>().is_err());
    assert!("on-fire".parse::<ConditionId>().is_err());
}

#[test]
fn catalog_kinds() {
    assert_eq!(ConditionId::Burning.kind(), ConditionKind::Timed);
    assert_eq!(ConditionId::Prone.kind(), ConditionKind::Toggle);
    assert_eq!(
        ConditionId::Wound(WoundTier::Light).ladder_group(),
        Some(LadderGroup::Wound)
    );
    assert_eq!(
        ConditionId::Stress(StressTier::Tense).ladder_group(),
        Some(LadderGroup::Stress)
    );
    assert_eq!(ConditionId::Shocked.ladder_group(), None);
}

#[test]
fn ladder_groups_hold_one_tier() {
    let mut set = ConditionSet::default();
    set.add(ConditionId::Fatigue(FatigueTier::Winded));
    set.add(ConditionId::Fatigue(FatigueTier::Exhausted));
    assert_eq!(set.fatigue(), Some(FatigueTier::Exhausted));
    assert!(!set.has(ConditionId::Fatigue(FatigueTier::Winded)));

    set.add(ConditionId::Stress(StressTier::Tense));
    assert_eq!(set.iter().count(), 2);
}

#[test]
fn toggles_and_timers() {
    let mut set = ConditionSet::default();
    assert!(set.toggle(ConditionId::Prone));
    assert!(!set.toggle(ConditionId::Prone));
    assert!(set.is_empty());

    set.add_timed(ConditionId::Blinded, 2);
    assert_eq!(set.decrement(ConditionId::Blinded), Some(1));
    assert!(set.has(ConditionId::Blinded));
    assert_eq!(set.decrement(ConditionId::Blinded), Some(0));
    assert!(!set.has(ConditionId::Blinded));
    assert_eq!(set.remaining(ConditionId::Blinded), None);
    assert_eq!(set.decrement(ConditionId::Blinded), None);
}

#[test]
fn wound_penalties_divide_after_flat() {
    let mut c = Combatant::new("a", "Ada", Stats {
        ref_: 9,
        ..Stats::default()
    });
    c.conditions.add(ConditionId::Wound(WoundTier::Serious));
    assert_eq!(c.effective_stat(Stat::Ref), 7);

    c.conditions.add(ConditionId::Wound(WoundTier::Critical));
    assert_eq!(c.effective_stat(Stat::Ref), 4);

    c.conditions.add(ConditionId::Blinded);
    // (9 - 3) / 2
    assert_eq!(c.effective_stat(Stat::Ref), 3);

    c.conditions.add(ConditionId::Wound(WoundTier::Mortal1));
    assert_eq!(c.effective_stat(Stat::Ref), 2);
    assert_eq!(c.effective_stat(Stat::Tech), 6);
}

#[test]
fn penalties_never_go_negative() {
    let mut c = Combatant::new("a", "Ada", Stats {
        ref_: 2,
        ..Stats::default()
    });
    c.conditions.add(ConditionId::Fatigue(FatigueTier::Exhausted));
    c.conditions.add(ConditionId::Blinded);
    assert_eq!(c.effective_stat(Stat::Ref), 0);
}

#[test]
fn lost_leg_halves_movement() {
    let mut c = Combatant::new("a", "Ada", Stats::default());
    c.conditions.add(ConditionId::LostRightLeg);
    assert_eq!(c.effective_stat(Stat::Ma), 3);
    assert_eq!(c.walk_allowance(&RulesConfig::default()), 6.0);
}

#[test]
fn taser_save_decides_the_condition() {
    let rules = RulesConfig::default();
    let taser = ExoticEffect::SaveOrCondition {
        condition: ConditionId::Shocked,
        penalty: 2,
    };
    let mut log = Vec::new();

    let mut c = Combatant::new("a", "Ada", Stats::default());
    // BODY 6 - 2 = 4: rolling 4 passes.
    let hit = apply_exotic_effect(&mut c, &taser, None, &mut |_: DamageDice| 4, &rules, |m| {
        log.push(m)
    });
    assert!(!hit);
    assert!(!c.conditions.has(ConditionId::Shocked));

    let hit = apply_exotic_effect(&mut c, &taser, None, &mut |_: DamageDice| 5, &rules, |m| {
        log.push(m)
    });
    assert!(hit);
    assert!(c.conditions.has(ConditionId::Shocked));
    assert!(log.iter().any(|l| l.starts_with("[SAVE][Ada]")));
}

#[test]
fn timed_effects_start_their_countdown() {
    let rules = RulesConfig::default();
    let mut c = Combatant::new("a", "Ada", Stats::default());
    let mut never = |_: DamageDice| -> i32 { panic!("no roll expected") };

    let flame = ExoticEffect::Timed {
        condition: ConditionId::Burning,
        turns: 3,
    };
    assert!(apply_exotic_effect(&mut c, &flame, None, &mut never, &rules, |_| {}));
    assert_eq!(c.conditions.remaining(ConditionId::Burning), Some(3));

    let acid = ExoticEffect::Timed {
        condition: ConditionId::Acid,
        turns: 2,
    };
    assert!(apply_exotic_effect(&mut c, &acid, None, &mut never, &rules, |_| {}));
    assert_eq!(c.conditions.acid_location(), Some(Location::Torso));

    c.conditions.remove(ConditionId::Acid);
    assert_eq!(c.conditions.acid_location(), None);
}

#[test]
fn zero_turn_effects_do_nothing() {
    let rules = RulesConfig::default();
    let mut c = Combatant::new("a", "Ada", Stats::default());
    let mut never = |_: DamageDice| -> i32 { panic!("no roll expected") };

    for condition in [ConditionId::Burning, ConditionId::Acid] {
        let fizzle = ExoticEffect::Timed { condition, turns: 0 };
        assert!(!apply_exotic_effect(&mut c, &fizzle, Some(Location::Head), &mut never, &rules, |_| {}));
        assert!(!c.conditions.has(condition));
        assert_eq!(c.conditions.remaining(condition), None);
    }
    assert_eq!(c.conditions.acid_location(), None);
    assert!(!c.conditions.add_timed(ConditionId::Blinded, 0));
    assert!(c.conditions.is_empty());
}

#[test]
fn stored_ladder_ids_land_in_their_slot() {
    let set: ConditionSet = serde_json::from_str(
        r#"{"flags":["wound-serious","wound-critical","stress-2","prone"],"remaining":{"blinded":2}}"#,
    )
    .unwrap();
    assert_eq!(set.wound_tier(), Some(WoundTier::Critical));
    assert_eq!(set.stress(), Some(StressTier::Stressed));
    assert!(set.has(ConditionId::Prone));
    assert_eq!(set.iter().count(), 3);
    assert_eq!(set.remaining(ConditionId::Blinded), None);

    let mut c = Combatant::new("a", "Ada", Stats {
        ref_: 9,
        ..Stats::default()
    });
    c.conditions = set;
    // Critical alone: 9 / 2
    assert_eq!(c.effective_stat(Stat::Ref), 4);

    let again: ConditionSet = serde_json::from_str(&serde_json::to_string(&c.conditions).unwrap()).unwrap();
    assert_eq!(again, c.conditions);
}

#[test]
fn effects_deserialize_from_tagged_json() {
    let e: ExoticEffect =
        serde_json::from_str(r#"{"type":"save_or_condition","condition":"shocked","penalty":2}"#)
            .unwrap();
    assert_eq!(
        e,
        ExoticEffect::SaveOrCondition {
            condition: ConditionId::Shocked,
            penalty: 2
        }
    );
    let e: ExoticEffect = serde_json::from_str(r#"{"type":"condition","condition":"deafened"}"#).unwrap();
    assert_eq!(
        e,
        ExoticEffect::Condition {
            condition: ConditionId::Deafened
        }
    );
}

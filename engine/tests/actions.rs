use cpr_engine::actor::{Combatant, Position, Stats};
use cpr_engine::combat::actions::{record_movement, register_action};
use cpr_engine::conditions::ConditionId;
use cpr_engine::encounter::Encounter;
use cpr_engine::{CombatantId, RulesConfig};

fn skirmish() -> Encounter {
    let mut enc = Encounter::new()
        .with(Combatant::new("solo", "Solo", Stats::default()))
        .with(Combatant::new("netrunner", "Netrunner", Stats::default()));
    enc.start(&"solo".into());
    enc
}

fn surging(enc: &Encounter, id: &str) -> bool {
    enc.get(&id.into()).unwrap().conditions.has(ConditionId::ActionSurge)
}

#[test]
fn second_action_grants_the_surge_and_only_once() {
    let mut enc = skirmish();
    let solo = CombatantId::from("solo");
    let mut log = Vec::new();

    assert!(!register_action(&mut enc, &solo, |m| log.push(m)));
    assert!(!surging(&enc, "solo"));

    assert!(register_action(&mut enc, &solo, |m| log.push(m)));
    assert!(surging(&enc, "solo"));
    assert!(log.iter().any(|l| l.contains("gains Extra Action")));

    assert!(!register_action(&mut enc, &solo, |m| log.push(m)));
    assert!(surging(&enc, "solo"));
    assert_eq!(enc.get(&solo).unwrap().scratch.actions, 3);
}

#[test]
fn actions_out_of_turn_do_not_count() {
    let mut enc = skirmish();
    let other = CombatantId::from("netrunner");
    assert!(!register_action(&mut enc, &other, |_| {}));
    assert!(!register_action(&mut enc, &other, |_| {}));
    assert_eq!(enc.get(&other).unwrap().scratch.actions, 0);
    assert!(!surging(&enc, "netrunner"));

    let mut idle = skirmish();
    idle.active = false;
    assert!(!register_action(&mut idle, &"solo".into(), |_| {}));
    assert_eq!(idle.get(&"solo".into()).unwrap().scratch.actions, 0);
}

#[test]
fn running_past_the_walk_allowance_costs_one_action() {
    let rules = RulesConfig::default();
    let mut enc = skirmish();
    let solo = CombatantId::from("solo");
    let origin = Position::new(0.0, 0.0);

    // MA 6 walks 12m.
    assert!(!record_movement(&mut enc, &solo, origin, Position::new(5.0, 0.0), &rules, |_| {}));
    assert!(!record_movement(
        &mut enc,
        &solo,
        Position::new(5.0, 0.0),
        Position::new(12.0, 0.0),
        &rules,
        |_| {}
    ));
    assert_eq!(enc.get(&solo).unwrap().scratch.actions, 0);

    assert!(record_movement(
        &mut enc,
        &solo,
        Position::new(12.0, 0.0),
        Position::new(15.0, 4.0),
        &rules,
        |_| {}
    ));
    assert_eq!(enc.get(&solo).unwrap().scratch.actions, 1);

    assert!(!record_movement(
        &mut enc,
        &solo,
        Position::new(15.0, 4.0),
        Position::new(30.0, 4.0),
        &rules,
        |_| {}
    ));
    assert_eq!(enc.get(&solo).unwrap().scratch.actions, 1);
}

#[test]
fn movement_and_an_attack_trigger_the_surge() {
    let rules = RulesConfig::default();
    let mut enc = skirmish();
    let solo = CombatantId::from("solo");
    record_movement(
        &mut enc,
        &solo,
        Position::new(0.0, 0.0),
        Position::new(0.0, 20.0),
        &rules,
        |_| {},
    );
    assert!(!surging(&enc, "solo"));
    assert!(register_action(&mut enc, &solo, |_| {}));
    assert!(surging(&enc, "solo"));
}

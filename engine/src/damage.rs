//! Applying one resolved attack to its targets.
//!
//! [`preview`] computes the per-location breakdown without touching any
//! state. [`commit`] recomputes it per target and applies it step by step.
//! The steps are not atomic: if something fails midway, earlier steps stay
//! applied, so each one is logged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actor::{Combatant, CombatantId, ItemId};
use crate::armor::{ablate_location, location_sp, AblationChange};
use crate::checks::SaveResult;
use crate::conditions::{apply_exotic_effect, ConditionId, ExoticEffect};
use crate::config::RulesConfig;
use crate::encounter::Encounter;
use crate::error::{EngineError, Result};
use crate::life::{apply_wounds, roll_death_save, roll_stun_save, WoundChange};
use crate::location::Location;
use crate::penetration::{resolve_hit, AmmoType, Hardness, MeleeDamageType, Penetration};
use crate::routing::{cyberlimb_mut, limb_slot, route, LimbSlot};
use crate::Roller;

/// Raw damage that landed on one location, as rolled upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub location: Location,
    pub raw_damage: i32,
}

impl Hit {
    pub fn new(location: Location, raw_damage: i32) -> Self {
        Self {
            location,
            raw_damage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHits {
    pub target: CombatantId,
    pub per_location_hits: Vec<Hit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackData {
    pub targets: Vec<TargetHits>,
    #[serde(default)]
    pub ammo_type: AmmoType,
    #[serde(default)]
    pub melee_damage_type: MeleeDamageType,
    #[serde(default)]
    pub exotic_effect: Option<ExoticEffect>,
    /// Location the attack was aimed at, used by lingering effects.
    #[serde(default)]
    pub hit_location: Option<Location>,
}

impl AttackData {
    pub fn penetration(&self) -> Penetration {
        Penetration {
            melee: self.melee_damage_type,
            ammo: self.ammo_type,
        }
    }

    /// Rejects data that cannot be resolved at all.
    pub fn validate(&self) -> Result<()> {
        for t in &self.targets {
            if t.target.0.trim().is_empty() {
                return Err(EngineError::MalformedHits {
                    target: t.target.to_string(),
                    reason: "empty target id".to_string(),
                });
            }
            if let Some(hit) = t.per_location_hits.iter().find(|h| h.raw_damage < 0) {
                return Err(EngineError::NegativeDamage {
                    location: hit.location,
                    damage: hit.raw_damage,
                });
            }
        }
        Ok(())
    }
}

/// The persisted attack; `applied` guards against double application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub id: String,
    pub attack: AttackData,
    #[serde(default)]
    pub applied: bool,
}

impl AttackRecord {
    pub fn new(id: &str, attack: AttackData) -> Self {
        Self {
            id: id.to_string(),
            attack,
            applied: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HitLine {
    pub raw: i32,
    pub damage: i32,
    pub penetrated: bool,
    pub wound: i32,
    pub cyberlimb: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationBreakdown {
    pub location: Location,
    pub base_sp: i32,
    pub hardness: Option<Hardness>,
    pub effective_sp: i32,
    pub hits: Vec<HitLine>,
    pub penetrating_hits: i32,
    pub wound: i32,
    pub cyberlimb: i32,
    /// Cyberlimb item taking the structural damage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cyberlimb_item: Option<ItemId>,
    /// The location points at a cyberlimb that no longer exists; its
    /// structural damage goes nowhere.
    pub dropped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPreview {
    pub target: CombatantId,
    pub name: String,
    pub locations: Vec<LocationBreakdown>,
    pub total_wound: i32,
    pub total_cyberlimb: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DamagePreview {
    pub targets: Vec<TargetPreview>,
}

/// Breakdown for one target. Locations come out in body order.
pub fn preview_target(target: &Combatant, hits: &[Hit], pen: Penetration) -> TargetPreview {
    let mut by_location: BTreeMap<Location, Vec<i32>> = BTreeMap::new();
    for hit in hits {
        by_location.entry(hit.location).or_default().push(hit.raw_damage);
    }

    let btm = target.stats.body_modifier();
    let mut locations = Vec::with_capacity(by_location.len());
    for (location, raws) in by_location {
        let (base_sp, hardness) = match location_sp(target, location) {
            Some((sp, h)) => (sp, Some(h)),
            None => (0, None),
        };
        let slot = limb_slot(target, location);

        let mut row = LocationBreakdown {
            location,
            base_sp,
            hardness,
            effective_sp: 0,
            hits: Vec::with_capacity(raws.len()),
            penetrating_hits: 0,
            wound: 0,
            cyberlimb: 0,
            cyberlimb_item: None,
            dropped: false,
        };
        match &slot {
            LimbSlot::Cyber(id) => row.cyberlimb_item = Some(id.clone()),
            LimbSlot::Missing(_) => row.dropped = true,
            LimbSlot::Flesh => {}
        }

        for raw in raws {
            let res = resolve_hit(raw, base_sp, hardness.unwrap_or_default(), pen, location);
            let routed = route(res.damage, &slot, btm);
            row.effective_sp = res.effective_sp;
            row.penetrating_hits += i32::from(res.penetrated);
            row.wound = row.wound.saturating_add(routed.wound);
            row.cyberlimb = row.cyberlimb.saturating_add(routed.cyberlimb);
            row.hits.push(HitLine {
                raw,
                damage: res.damage,
                penetrated: res.penetrated,
                wound: routed.wound,
                cyberlimb: routed.cyberlimb,
            });
        }
        locations.push(row);
    }

    TargetPreview {
        target: target.id.clone(),
        name: target.name.clone(),
        total_wound: locations.iter().fold(0, |acc, l| acc.saturating_add(l.wound)),
        total_cyberlimb: locations
            .iter()
            .filter(|l| !l.dropped)
            .fold(0, |acc, l| acc.saturating_add(l.cyberlimb)),
        locations,
    }
}

/// What the attack would do, without changing anything. Targets missing
/// from the encounter are left out.
pub fn preview(encounter: &Encounter, attack: &AttackData) -> Result<DamagePreview> {
    attack.validate()?;
    let pen = attack.penetration();
    let targets = attack
        .targets
        .iter()
        .filter_map(|t| {
            let c = encounter.get(&t.target);
            if c.is_none() {
                debug!(combatant = %t.target, "preview: unknown target skipped");
            }
            c.map(|c| preview_target(c, &t.per_location_hits, pen))
        })
        .collect();
    Ok(DamagePreview { targets })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetReport {
    pub target: CombatantId,
    pub wounds: Option<WoundChange>,
    pub ablation: Vec<AblationChange>,
    pub destroyed_cyberlimbs: Vec<Location>,
    pub severed_limbs: Vec<Location>,
    pub stun_save: Option<SaveResult>,
    pub death_save: Option<SaveResult>,
    pub exotic_applied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitReport {
    pub preview: DamagePreview,
    pub targets: Vec<TargetReport>,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    Applied(CommitReport),
    AlreadyApplied,
}

/// Applies the attack once. A record that was already applied is left alone.
pub fn commit(
    encounter: &mut Encounter,
    record: &mut AttackRecord,
    roller: &mut dyn Roller,
    rules: &RulesConfig,
) -> Result<CommitOutcome> {
    if record.applied {
        debug!(record = %record.id, "attack already applied");
        return Ok(CommitOutcome::AlreadyApplied);
    }
    record.attack.validate()?;

    let attack = &record.attack;
    let pen = attack.penetration();
    let mut report = CommitReport::default();

    for hits in &attack.targets {
        let Some(target) = encounter.get_mut(&hits.target) else {
            debug!(combatant = %hits.target, "commit: unknown target skipped");
            continue;
        };
        let breakdown = preview_target(target, &hits.per_location_hits, pen);
        let mut log = |m: String| report.log.push(m);
        let result = apply_to_target(target, &breakdown, attack, roller, rules, &mut log);
        report.targets.push(result);
        report.preview.targets.push(breakdown);
    }

    record.applied = true;
    info!(record = %record.id, targets = report.targets.len(), "attack applied");
    Ok(CommitOutcome::Applied(report))
}

fn apply_to_target(
    target: &mut Combatant,
    breakdown: &TargetPreview,
    attack: &AttackData,
    roller: &mut dyn Roller,
    rules: &RulesConfig,
    mut log: impl FnMut(String),
) -> TargetReport {
    let mut report = TargetReport {
        target: target.id.clone(),
        ..TargetReport::default()
    };
    let mut death_save_owed = false;
    let mut structural: i32 = 0;

    // Cyberlimbs take structural damage.
    for row in breakdown.locations.iter().filter(|r| r.cyberlimb > 0) {
        if row.dropped {
            warn!(
                combatant = %target.name,
                location = %row.location,
                damage = row.cyberlimb,
                "cyberlimb reference missing; structural damage dropped"
            );
            log(format!(
                "[CYBER][{}] {} has no cyberlimb item; {} damage dropped",
                target.name, row.location, row.cyberlimb
            ));
            continue;
        }
        let Some(id) = row.cyberlimb_item.as_ref() else {
            continue;
        };
        let Some(limb) = cyberlimb_mut(target, id) else {
            continue;
        };
        let destroyed = limb.take_damage(row.cyberlimb);
        let (structure, disabled) = (limb.structure, limb.is_disabled());
        structural = structural.saturating_add(row.cyberlimb);
        log(format!(
            "[CYBER][{}] {} takes {} structure → {}{}",
            target.name,
            row.location,
            row.cyberlimb,
            structure,
            if disabled && !destroyed { " (disabled)" } else { "" }
        ));
        if destroyed {
            let removed = target.remove_item_tree(id);
            info!(combatant = %target.name, location = %row.location, items = removed.len(), "cyberlimb destroyed");
            log(format!(
                "[CYBER][{}] {} destroyed ({} items lost)",
                target.name,
                row.location,
                removed.len()
            ));
            if let Some(lost) = row.location.lost_limb_condition() {
                if target.conditions.add(lost) {
                    log(format!("[COND][{}] gains {}", target.name, lost.label()));
                }
            }
            report.destroyed_cyberlimbs.push(row.location);
            death_save_owed = true;
        }
    }
    debug!(combatant = %target.name, structural, "step: cyberlimb structure");

    // Wound pool.
    let state_before = target.wound_state(rules);
    if breakdown.total_wound > 0 {
        report.wounds = Some(apply_wounds(target, breakdown.total_wound, rules, &mut log));
    }
    debug!(combatant = %target.name, wounds = breakdown.total_wound, "step: wound pool");

    // Ablation counts penetrating hits, not damage.
    for row in breakdown.locations.iter().filter(|r| r.penetrating_hits > 0) {
        let changes = ablate_location(target, row.location, row.penetrating_hits);
        for ch in &changes {
            log(format!(
                "[ARMOR][{}] {} at {}: ablation {} → {}",
                target.name, ch.item, ch.location, ch.before, ch.after
            ));
        }
        report.ablation.extend(changes);
    }
    debug!(combatant = %target.name, pieces = report.ablation.len(), "step: ablation");

    let damaged = breakdown.total_wound > 0 || structural > 0;
    if damaged && target.conditions.remove(ConditionId::Stabilized) {
        log(format!("[COND][{}] is no longer Stabilized", target.name));
    }
    if damaged && !target.conditions.has(ConditionId::Shocked) {
        report.stun_save = Some(roll_stun_save(target, roller, rules, &mut log));
    }

    // Flesh limbs hit hard enough in one attack come off.
    for row in breakdown
        .locations
        .iter()
        .filter(|r| r.location.is_limb() && r.cyberlimb_item.is_none() && !r.dropped)
        .filter(|r| r.wound >= rules.lost_limb_threshold)
    {
        if let Some(lost) = row.location.lost_limb_condition() {
            if target.conditions.add(lost) {
                info!(combatant = %target.name, location = %row.location, "limb severed");
                log(format!("[COND][{}] gains {}", target.name, lost.label()));
            }
            report.severed_limbs.push(row.location);
            death_save_owed = true;
        }
    }

    let state_after = target.wound_state(rules);
    if !rules.is_mortal(state_before) && rules.is_mortal(state_after) {
        death_save_owed = true;
    }
    if death_save_owed {
        report.death_save = Some(roll_death_save(target, roller, rules, &mut log));
    }
    debug!(combatant = %target.name, death_save_owed, "step: saves");

    if let Some(effect) = attack.exotic_effect.as_ref() {
        report.exotic_applied =
            apply_exotic_effect(target, effect, attack.hit_location, roller, rules, &mut log);
    }

    report
}

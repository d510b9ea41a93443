//! JSON-in, JSON-out entry points for hosts that keep actor state
//! themselves: they send the encounter, get back the updated one.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::content::{find_weapon, load_builtin_encounter};
use crate::damage::{self, AttackData, AttackRecord, CommitOutcome, DamagePreview};
use crate::encounter::{Encounter, Role, TurnChange};
use crate::turns::{on_turn_change, TurnReport};
use crate::{Dice, RulesConfig};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PreviewRequest {
    pub encounter: Encounter,
    pub attack: AttackData,
    /// Built-in weapon preset whose ammo, blade and effect override the attack's.
    #[serde(default)]
    pub weapon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommitRequest {
    pub encounter: Encounter,
    pub record: AttackRecord,
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitResponse {
    pub encounter: Encounter,
    pub record: AttackRecord,
    pub outcome: CommitOutcome,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TurnRequest {
    pub encounter: Encounter,
    pub event: TurnChange,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub encounter: Encounter,
    pub report: TurnReport,
}

fn with_weapon(mut attack: AttackData, weapon: Option<&str>) -> Result<AttackData> {
    if let Some(name) = weapon {
        find_weapon(name)?.apply_to(&mut attack);
    }
    Ok(attack)
}

pub fn preview(req: PreviewRequest) -> Result<DamagePreview> {
    let attack = with_weapon(req.attack, req.weapon.as_deref())?;
    let preview = damage::preview(&req.encounter, &attack).context("attack could not be resolved")?;
    Ok(preview)
}

pub fn commit(req: CommitRequest) -> Result<CommitResponse> {
    let mut encounter = req.encounter;
    let mut record = req.record;
    record.attack = with_weapon(record.attack, req.weapon.as_deref())?;
    let mut dice = Dice::from_seed(req.seed);
    let outcome = damage::commit(&mut encounter, &mut record, &mut dice, &req.rules)
        .with_context(|| format!("attack '{}' could not be applied", record.id))?;
    Ok(CommitResponse {
        encounter,
        record,
        outcome,
    })
}

pub fn turn_change(req: TurnRequest) -> TurnResponse {
    let mut encounter = req.encounter;
    let mut dice = Dice::from_seed(req.seed);
    let report = on_turn_change(&mut encounter, &req.event, req.role, &mut dice, &req.rules);
    TurnResponse { encounter, report }
}

pub fn preview_json(input: &str) -> Result<String> {
    let req: PreviewRequest = serde_json::from_str(input).context("invalid preview request")?;
    Ok(serde_json::to_string(&preview(req)?)?)
}

pub fn commit_json(input: &str) -> Result<String> {
    let req: CommitRequest = serde_json::from_str(input).context("invalid commit request")?;
    Ok(serde_json::to_string(&commit(req)?)?)
}

pub fn turn_change_json(input: &str) -> Result<String> {
    let req: TurnRequest = serde_json::from_str(input).context("invalid turn request")?;
    Ok(serde_json::to_string(&turn_change(req))?)
}

/// Loads an encounter from a file, or a built-in one by id.
pub fn load_encounter(source: &str) -> Result<Encounter> {
    let path = Path::new(source);
    if !path.exists() {
        return load_builtin_encounter(source);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read encounter JSON: {}", source))?;
    let data = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse encounter JSON: {}", source))?;
    Ok(data)
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use cpr_engine::armor::location_sp;
use cpr_engine::content::{builtin_encounters, find_weapon, load_builtin_encounter};
use cpr_engine::damage::{self, AttackData, AttackRecord, CommitOutcome, DamagePreview};
use cpr_engine::encounter::Role;
use cpr_engine::turns::on_turn_change;
use cpr_engine::{logging, DamageDice, Dice, Encounter, Location, Roller, RulesConfig, TurnChange};
use encoding_rs::Encoding;
use tracing::info;

#[derive(Copy, Clone, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Cmd {
    /// Roll a dice formula a few times
    Roll {
        /// Dice formula, e.g. 2d10
        #[arg(long, default_value = "1d10")]
        dice: String,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of rolls
        #[arg(long, default_value_t = 5)]
        rolls: u32,
    },
    /// Show what an attack would do, without applying it
    Preview {
        /// Encounter JSON file or built-in encounter id
        #[arg(long, default_value = "alley")]
        encounter: String,
        /// Attack JSON file
        #[arg(long)]
        attack: PathBuf,
        /// Weapon preset overriding ammo, blade and effect
        #[arg(long)]
        weapon: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Apply an attack once and print the log
    Commit {
        #[arg(long, default_value = "alley")]
        encounter: String,
        /// Attack JSON file; only read when no saved record exists
        #[arg(long)]
        attack: Option<PathBuf>,
        #[arg(long)]
        weapon: Option<String>,
        /// Attack record id for a new record
        #[arg(long, default_value = "attack-1")]
        id: String,
        /// Attack record file ({id, attack, applied}); read if present, written back after the commit
        #[arg(long)]
        record: Option<PathBuf>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Rules config (YAML or JSON)
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Write the updated encounter here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Hand the turn to another combatant and run the turn rules
    Turn {
        #[arg(long, default_value = "alley")]
        encounter: String,
        #[arg(long)]
        prior: Option<String>,
        #[arg(long)]
        current: String,
        #[arg(long, default_value_t = 1)]
        round: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        rules: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the current SP at every location of one combatant
    Sp {
        #[arg(long, default_value = "alley")]
        encounter: String,
        /// Combatant id
        #[arg(long)]
        target: String,
    },
    /// Serialize an encounter to JSON (stdout)
    Dump {
        #[arg(long, default_value = "alley")]
        encounter: String,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
}

#[derive(Parser)]
#[command(name = "cpr")]
#[command(about = "Damage, armor and condition rules harness")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

/// Reads a text file, honoring a UTF-8/UTF-16 BOM if present.
fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn load_encounter(source: &str) -> anyhow::Result<Encounter> {
    let path = Path::new(source);
    if !path.exists() {
        return load_builtin_encounter(source).with_context(|| {
            let mut ids: Vec<_> = builtin_encounters().into_keys().collect();
            ids.sort_unstable();
            format!("not a file; built-in encounters are: {}", ids.join(", "))
        });
    }
    let text = read_text_auto(path)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse encounter {}", source))
}

fn load_attack(path: &Path, weapon: Option<&str>) -> anyhow::Result<AttackData> {
    let text = read_text_auto(path)?;
    let mut attack: AttackData = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse attack {}", path.display()))?;
    if let Some(name) = weapon {
        find_weapon(name)?.apply_to(&mut attack);
    }
    Ok(attack)
}

fn load_record(
    saved: Option<&Path>,
    attack: Option<&Path>,
    id: &str,
    weapon: Option<&str>,
) -> anyhow::Result<AttackRecord> {
    if let Some(path) = saved.filter(|p| p.exists()) {
        let text = read_text_auto(path)?;
        return serde_json::from_str(&text)
            .with_context(|| format!("failed to parse attack record {}", path.display()));
    }
    let attack = attack.context("--attack is required when there is no saved record")?;
    Ok(AttackRecord::new(id, load_attack(attack, weapon)?))
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<RulesConfig> {
    match path {
        Some(p) => RulesConfig::load(p),
        None => Ok(RulesConfig::default()),
    }
}

fn save_encounter(encounter: &Encounter, out: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = out {
        fs::write(path, serde_json::to_string_pretty(encounter)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "encounter written");
    }
    Ok(())
}

fn print_preview(preview: &DamagePreview) {
    for t in &preview.targets {
        println!("{} ({})", t.name, t.target);
        for row in &t.locations {
            let raws: Vec<String> = row.hits.iter().map(|h| h.raw.to_string()).collect();
            println!(
                "  {:<9} SP {:>2}→{:<2} hits [{}] wound {} cyber {}{}",
                row.location.to_string(),
                row.base_sp,
                row.effective_sp,
                raws.join(", "),
                row.wound,
                row.cyberlimb,
                if row.dropped { " (dropped)" } else { "" }
            );
        }
        println!("  total wound {} cyber {}", t.total_wound, t.total_cyberlimb);
    }
}

fn main() -> anyhow::Result<()> {
    logging::init("warn");
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Roll { dice, seed, rolls } => {
            let formula: DamageDice = dice.parse()?;
            let mut roller = Dice::from_seed(seed);
            for _ in 0..rolls {
                println!("{}", roller.roll(formula));
            }
        }
        Cmd::Preview {
            encounter,
            attack,
            weapon,
            format,
        } => {
            let encounter = load_encounter(&encounter)?;
            let attack = load_attack(&attack, weapon.as_deref())?;
            let preview = damage::preview(&encounter, &attack)?;
            match format {
                Format::Text => print_preview(&preview),
                Format::Json => println!("{}", serde_json::to_string_pretty(&preview)?),
            }
        }
        Cmd::Commit {
            encounter,
            attack,
            weapon,
            id,
            record,
            seed,
            rules,
            out,
        } => {
            let mut encounter = load_encounter(&encounter)?;
            let rules = load_rules(rules.as_deref())?;
            let mut attack_record =
                load_record(record.as_deref(), attack.as_deref(), &id, weapon.as_deref())?;
            let mut dice = Dice::from_seed(seed);
            match damage::commit(&mut encounter, &mut attack_record, &mut dice, &rules)? {
                CommitOutcome::Applied(report) => {
                    for line in &report.log {
                        println!("{line}");
                    }
                    save_encounter(&encounter, out.as_deref())?;
                    if let Some(path) = record.as_deref() {
                        fs::write(path, serde_json::to_string_pretty(&attack_record)?)
                            .with_context(|| format!("failed to write {}", path.display()))?;
                        info!(path = %path.display(), record = %attack_record.id, "attack record written");
                    }
                }
                CommitOutcome::AlreadyApplied => {
                    println!("attack {} already applied", attack_record.id)
                }
            }
        }
        Cmd::Turn {
            encounter,
            prior,
            current,
            round,
            seed,
            rules,
            out,
        } => {
            let mut encounter = load_encounter(&encounter)?;
            let rules = load_rules(rules.as_deref())?;
            let change = TurnChange {
                prior_combatant_id: prior.as_deref().map(Into::into),
                current_combatant_id: current.as_str().into(),
                round,
            };
            let mut dice = Dice::from_seed(seed);
            let report = on_turn_change(&mut encounter, &change, Role::Authority, &mut dice, &rules);
            for line in &report.log {
                println!("{line}");
            }
            println!("round {} → {}", encounter.round, current);
            save_encounter(&encounter, out.as_deref())?;
        }
        Cmd::Sp { encounter, target } => {
            let encounter = load_encounter(&encounter)?;
            let c = encounter
                .get(&target.as_str().into())
                .with_context(|| format!("no combatant '{}' in encounter", target))?;
            for loc in Location::ALL {
                match location_sp(c, loc) {
                    Some((sp, hardness)) => println!("{loc}: SP {sp} ({hardness:?})"),
                    None => println!("{loc}: unarmored"),
                }
            }
        }
        Cmd::Dump { encounter, compact } => {
            let encounter = load_encounter(&encounter)?;
            if compact {
                println!("{}", serde_json::to_string(&encounter)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&encounter)?);
            }
        }
    }
    Ok(())
}

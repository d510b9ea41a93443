use cpr_engine::api::{commit_json, preview_json, turn_change_json};
use cpr_engine::{logging, DamageDice, Dice, Roller};
use jni::objects::{JClass, JString};
use jni::sys::{jint, jlong, jstring};
use jni::JNIEnv;
use serde_json::{json, Value};

/// Wraps an engine reply in the `{ok, result | error}` envelope the host expects.
pub fn envelope(reply: anyhow::Result<String>) -> String {
    let payload = match reply.and_then(|s| Ok(serde_json::from_str::<Value>(&s)?)) {
        Ok(result) => json!({ "ok": true, "result": result }),
        Err(e) => json!({ "ok": false, "error": format!("{e:#}") }),
    };
    payload.to_string()
}

/// Sum of `n` dice with `sides` faces from a seeded roller.
/// n <= 0 → 0, sides <= 1 → 1 per die.
pub fn roll_internal(seed: i64, n: i32, sides: i32) -> i32 {
    if n <= 0 {
        return 0;
    }
    if sides <= 1 {
        return n;
    }
    let dice = DamageDice::new(n.min(u8::MAX as i32) as u8, sides.min(u8::MAX as i32) as u8);
    Dice::from_seed(seed as u64).roll(dice)
}

fn to_jstring(env: &JNIEnv, s: String) -> jstring {
    match env.new_string(s) {
        Ok(js) => js.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

fn call_json(mut env: JNIEnv, json: JString, f: fn(&str) -> anyhow::Result<String>) -> jstring {
    logging::init("warn");
    let reply = match env.get_string(&json) {
        Ok(s) => {
            let input: String = s.into();
            f(&input)
        }
        Err(e) => Err(anyhow::anyhow!("invalid_input: {e}")),
    };
    to_jstring(&env, envelope(reply))
}

#[no_mangle]
pub extern "system" fn Java_com_cpr_Ffi_version(env: JNIEnv, _class: JClass) -> jstring {
    to_jstring(&env, format!("cpr-ffi {}", env!("CARGO_PKG_VERSION")))
}

#[no_mangle]
pub extern "system" fn Java_com_cpr_Ffi_roll(
    _env: JNIEnv<'_>,
    _class: JClass<'_>,
    seed: jlong,
    n: jint,
    sides: jint,
) -> jint {
    roll_internal(seed, n, sides)
}

#[no_mangle]
pub extern "system" fn Java_com_cpr_Ffi_previewJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call_json(env, json, preview_json)
}

#[no_mangle]
pub extern "system" fn Java_com_cpr_Ffi_commitJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call_json(env, json, commit_json)
}

#[no_mangle]
pub extern "system" fn Java_com_cpr_Ffi_turnChangeJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call_json(env, json, turn_change_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpr_engine::content::load_builtin_encounter;

    #[test]
    fn test_roll_internal() {
        let result1 = roll_internal(42, 3, 6);
        let result2 = roll_internal(42, 3, 6);
        assert_eq!(result1, result2);
        assert!((3..=18).contains(&result1));
    }

    #[test]
    fn test_roll_edge_cases() {
        assert_eq!(roll_internal(42, 0, 6), 0);
        assert_eq!(roll_internal(42, 3, 1), 3);
    }

    #[test]
    fn envelope_wraps_results_and_errors() {
        let v: Value = serde_json::from_str(&envelope(Ok(r#"{"a":1}"#.into()))).unwrap();
        assert_eq!(v["ok"], true);
        assert_eq!(v["result"]["a"], 1);

        let v: Value = serde_json::from_str(&envelope(preview_json("nope"))).unwrap();
        assert_eq!(v["ok"], false);
        assert!(v["error"].as_str().unwrap().contains("invalid preview request"));
    }

    #[test]
    fn commit_through_the_envelope() {
        let encounter = load_builtin_encounter("alley").unwrap();
        let req = json!({
            "encounter": encounter,
            "record": {
                "id": "a1",
                "attack": {
                    "targets": [{
                        "target": "ganger",
                        "perLocationHits": [{ "location": "torso", "rawDamage": 18 }]
                    }]
                }
            }
        });
        let v: Value = serde_json::from_str(&envelope(commit_json(&req.to_string()))).unwrap();
        assert_eq!(v["ok"], true);
        assert_eq!(v["result"]["encounter"]["combatants"]["ganger"]["damage"], 6);
    }
}

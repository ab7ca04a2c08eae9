//! Constructor-argument ABI encoding from the artifact's declared signature.

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::JsonAbi;
use serde_json::Value;

use crate::errors::{DeployError, Result};

/// ABI-encodes constructor arguments against the constructor declared in the
/// artifact ABI. Returns bare hex without a 0x prefix; the empty string when
/// the constructor takes no arguments.
pub fn encode_constructor_args(abi: &Value, args: &[Value]) -> Result<String> {
    let abi: JsonAbi = serde_json::from_value(abi.clone())?;

    let inputs = match abi.constructor() {
        Some(constructor) => &constructor.inputs,
        None => {
            if args.is_empty() {
                return Ok(String::new());
            }
            return Err(DeployError::InvalidInput(format!(
                "{} constructor arguments supplied but the contract declares no constructor",
                args.len()
            )));
        }
    };

    if inputs.len() != args.len() {
        return Err(DeployError::InvalidInput(format!(
            "constructor takes {} arguments, {} supplied",
            inputs.len(),
            args.len()
        )));
    }
    if inputs.is_empty() {
        return Ok(String::new());
    }

    let mut values = Vec::with_capacity(args.len());
    for (param, arg) in inputs.iter().zip(args) {
        let ty = param.resolve().map_err(|err| {
            DeployError::InvalidInput(format!(
                "unresolvable constructor parameter type {}: {err}",
                param.ty
            ))
        })?;
        values.push(coerce_arg(&ty, arg)?);
    }

    let encoded = DynSolValue::Tuple(values).abi_encode_params();
    Ok(alloy_primitives::hex::encode(encoded))
}

fn coerce_arg(ty: &DynSolType, arg: &Value) -> Result<DynSolValue> {
    // JSON strings coerce as-is; numbers and bools through their canonical
    // text form, which the dyn-abi parser accepts.
    let text = match arg {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ty.coerce_str(&text).map_err(|err| {
        DeployError::InvalidInput(format!(
            "constructor argument {text:?} does not fit type {ty}: {err}"
        ))
    })
}

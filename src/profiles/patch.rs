//! Profile patches applied to the serialized config.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::util::JsonPatch;
use json_patch::PatchOperation;
use serde_json::{Map, Value};
use tracing::debug;

const DEFAULT_OP: &str = "replace";

/// Apply `patches` in declaration order.
///
/// Every patch is first tried alone against `document`, so a bad path is
/// reported as `invalid path: <path>` for that patch. The whole list is then
/// applied at once; on failure `document` is not modified.
pub fn apply_patches(document: &mut Value, patches: &[JsonPatch]) -> ConfigResult<()> {
    let mut operations = Vec::with_capacity(patches.len());
    for patch in patches {
        let operation = to_operation(patch)?;
        try_patch(document, &operation).map_err(|err| {
            debug!(path = %patch.path, error = %err, "profile patch rejected");
            ConfigError::InvalidPatchPath(patch.path.clone())
        })?;
        operations.push(operation);
    }

    json_patch::patch(document, &operations).map_err(ConfigError::ApplyPatches)
}

/// Apply one operation to a copy of `document`.
fn try_patch(document: &Value, operation: &PatchOperation) -> Result<(), json_patch::PatchError> {
    let mut scratch = document.clone();
    json_patch::patch(&mut scratch, std::slice::from_ref(operation))
}

fn to_operation(patch: &JsonPatch) -> ConfigResult<PatchOperation> {
    let op = if patch.op.is_empty() {
        DEFAULT_OP
    } else {
        patch.op.as_str()
    };

    let mut operation = Map::new();
    operation.insert("op".into(), Value::from(op));
    operation.insert("path".into(), Value::from(patch.path.as_str()));
    match op {
        "move" | "copy" => {
            operation.insert("from".into(), Value::from(patch.from.as_str()));
        }
        "add" | "replace" | "test" => {
            operation.insert("value".into(), patch.value.clone().unwrap_or(Value::Null));
        }
        _ => {}
    }

    serde_json::from_value(Value::Object(operation))
        .map_err(|_| ConfigError::InvalidPatchPath(patch.path.clone()))
}

use std::{fs, path::Path};

use crate::{errors::PortalError, model::FormModel};

/// Loads the serialized FormModel snapshot the portal embeds in the page.
pub fn load_model_from_file(path: &Path) -> Result<FormModel, PortalError> {
    let data = fs::read_to_string(path)?;
    FormModel::from_json(&data)
}

/// Writes the model to disk atomically by staging to a temporary file.
pub fn save_model_to_file(model: &FormModel, path: &Path) -> Result<(), PortalError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(model)?;
    fs::write(&tmp, json)?;
    fs::rename(tmp, path)?;
    Ok(())
}

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema)]
pub struct ReadGdscriptParams {
    /// Path to the .gd script, relative to the project root (res:// accepted)
    pub file_path: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct CreateGdscriptParams {
    /// Path where the script should be created, relative to the project root
    pub file_path: String,
    /// GDScript content to write; `extends Node` is added when no extends line is present
    pub content: String,
    /// Optional class_name to declare after the extends line
    pub class_name: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct ModifyGdscriptParams {
    /// Path to the .gd script to modify, relative to the project root
    pub file_path: String,
    /// Name of the top-level function to add or replace
    pub function_name: String,
    /// Complete function definition, starting with its `func` line or its annotation lines
    pub function_content: String,
    /// For new functions only: insert after the declaration containing the first
    /// occurrence of this text (after the whole function when it falls inside one)
    pub insert_after: Option<String>,
}

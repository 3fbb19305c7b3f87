/// A spreadsheet received from the dashboard, forwarded as-is to an import endpoint.
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub const USER_IMPORT_COLUMNS: [&str; 5] = ["username", "name", "idNumber", "faceImage", "fingerPrint"];
pub const DEVICE_IMPORT_COLUMNS: [&str; 3] = ["name", "type", "location"];

/// Header-only CSV handed out as the bulk import template.
pub fn import_template(columns: &[&str]) -> String {
    format!("{}\n", columns.join(","))
}

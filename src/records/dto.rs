use serde::Deserialize;

/// Record create/update form body.
#[derive(Debug, Deserialize)]
pub struct RecordForm {
    pub fname: String,
    pub lname: String,
    pub email: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Delete form body; carries only the CSRF token.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub csrf_token: String,
}

impl RecordForm {
    /// Run the field validators, collecting every failure; on success the
    /// returned values are the normalized ones.
    pub fn validated(&self) -> Result<(String, String, String), Vec<String>> {
        let mut errors = Vec::new();
        let fname = crate::validate::first_name(&self.fname).map_err(|e| errors.push(e)).ok();
        let lname = crate::validate::last_name(&self.lname).map_err(|e| errors.push(e)).ok();
        let email = crate::validate::email(&self.email, 200).map_err(|e| errors.push(e)).ok();
        match (fname, lname, email) {
            (Some(f), Some(l), Some(e)) => Ok((f, l, e)),
            _ => Err(errors),
        }
    }
}

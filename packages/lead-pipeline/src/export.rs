//! CSV export of qualified leads.

use std::io;
use std::path::Path;

use crate::types::Lead;

const HEADER: [&str; 6] = [
    "Brand Name",
    "Website URL",
    "Facebook Profile",
    "Email",
    "Instagram",
    "Detection Methods",
];

const NO_PROFILE: &str = "No Facebook Profile";
const NO_EMAIL: &str = "No Email";

/// Write one row per lead, with a header row.
pub fn write_leads_csv<W: io::Write>(writer: W, leads: &[Lead]) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;

    for lead in leads {
        let methods = lead
            .detection_methods
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ");

        out.write_record([
            lead.name.as_str(),
            lead.website.as_str(),
            or_placeholder(&lead.social_profile_url, NO_PROFILE),
            or_placeholder(&lead.email, NO_EMAIL),
            lead.social_handle.as_str(),
            methods.as_str(),
        ])?;
    }

    out.flush()?;
    Ok(())
}

pub fn export_leads(path: &Path, leads: &[Lead]) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_leads_csv(io::BufWriter::new(file), leads)?;
    tracing::info!(path = %path.display(), leads = leads.len(), "Exported leads");
    Ok(())
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

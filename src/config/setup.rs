//! Interactive profile setup
//!
//! Collects the access code and contact data once, then persists them so
//! subsequent runs can start unattended. Contact field names match what
//! the booking endpoint expects; the phone number is stored with the
//! country prefix and notifications go out by mail.

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::config::Profile;
use crate::error::Result;
use crate::types::AccessCode;

/// Collect a profile interactively on stdin and write it to `path`.
pub fn run_setup(path: &Path) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let profile = collect_profile(&mut input)?;
    profile.save(path)?;
    println!("\nBooking profile written to {}", path.display());
    Ok(())
}

fn collect_profile(input: &mut dyn BufRead) -> Result<Profile> {
    println!(
        "Please enter your access code and contact data.\n\
         They are stored locally and reused on the next start.\n"
    );

    let code: AccessCode = prompt(input, "Code")?.parse()?;
    let plz = prompt(input, "Postal code of the service center")?;

    let anrede = prompt(input, "Salutation (Frau/Herr/...)")?;
    let vorname = prompt(input, "First name")?;
    let nachname = prompt(input, "Last name")?;
    let strasse = prompt(input, "Street")?;
    let hausnummer = prompt(input, "House number")?;
    let wohnort_plz = prompt(input, "Residential postal code")?;
    let wohnort = prompt(input, "City")?;
    let telefonnummer = prompt(input, "Phone number")?;
    let mail = prompt(input, "Mail")?;

    let kontakt = serde_json::json!({
        "anrede": anrede,
        "vorname": vorname,
        "nachname": nachname,
        "strasse": strasse,
        "hausnummer": hausnummer,
        "plz": wohnort_plz,
        "ort": wohnort,
        "phone": format!("+49{}", telefonnummer),
        "notificationChannel": "email",
        "notificationReceiver": mail,
    });

    Ok(Profile { code, plz, kontakt })
}

fn prompt(input: &mut dyn BufRead, label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

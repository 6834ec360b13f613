//! Ordered, independently failable config merges

use crate::error::{format_user_error, PatchError};
use crate::mods::{Mod, ModPatcher, Region};

/// Aggregated result of a patch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// At least one region could not be applied
    pub incomplete: bool,
    /// Lines for the output sink, in order
    pub notices: Vec<String>,
}

impl PatchReport {
    fn record<T>(&mut self, region: Region, result: Result<T, PatchError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Patching {} failed: {}", region.surface(), e);
                self.incomplete = true;
                self.notices.push(format_user_error(e));
                self.notices.push(not_installed_notice(region));
                None
            }
        }
    }

    fn input_keys(&mut self, result: Result<(usize, usize), PatchError>) {
        if let Some((added, skipped)) = self.record(Region::InputKeys, result) {
            self.notices.push(input_keys_notice(added, skipped));
        }
    }
}

pub(crate) fn not_installed_notice(region: Region) -> String {
    format!(
        "Note: Additions to {} could not be automatically installed.",
        region.surface()
    )
}

fn input_keys_notice(added: usize, skipped: usize) -> String {
    if skipped > 0 {
        format!("Added {} input keys (skipped {})", added, skipped)
    } else {
        format!("Added {} input keys", added)
    }
}

/// Apply every region of a freshly installed mod, then sync its priority
pub fn run_install_patches(patcher: &dyn ModPatcher, m: &mut Mod) -> PatchReport {
    let mut report = PatchReport::default();

    for region in Region::INSTALL_ORDER {
        match region {
            Region::Menus => {
                report.record(region, patcher.install_menus(m));
            }
            Region::XmlKeys => {
                report.record(region, patcher.install_xml_keys(m));
            }
            Region::InputKeys => report.input_keys(patcher.install_input_keys(m)),
            Region::UserSettings => {
                report.record(region, patcher.install_user_settings(m));
            }
        }
    }

    patcher.check_priority(m);
    report
}

/// Re-apply an installed mod's regions
///
/// Each region is reversed before being applied again, except input keys
/// which are only added. Reversal failures abort the run.
pub fn run_reinstall_patches(
    patcher: &dyn ModPatcher,
    m: &mut Mod,
) -> Result<PatchReport, PatchError> {
    let mut report = PatchReport::default();

    patcher.uninstall_user_settings(m)?;
    report.record(Region::UserSettings, patcher.install_user_settings(m));

    patcher.uninstall_xml_keys(m)?;
    report.record(Region::XmlKeys, patcher.install_xml_keys(m));

    patcher.uninstall_menus(m)?;
    report.record(Region::Menus, patcher.install_menus(m));

    report.input_keys(patcher.install_input_keys(m));

    Ok(report)
}

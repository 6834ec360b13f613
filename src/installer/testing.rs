//! Recording patcher for installer tests

use crate::error::PatchError;
use crate::mods::{Mod, ModPatcher, Region};
use std::cell::RefCell;
use std::collections::HashSet;

#[derive(Default)]
pub struct FakePatcher {
    failing: HashSet<Region>,
    failing_reverse: bool,
    calls: RefCell<Vec<&'static str>>,
}

impl FakePatcher {
    pub fn failing(regions: &[Region]) -> Self {
        Self {
            failing: regions.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn with_failing_reverse(mut self) -> Self {
        self.failing_reverse = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn apply(&self, call: &'static str, region: Region) -> Result<(), PatchError> {
        self.calls.borrow_mut().push(call);
        if self.failing.contains(&region) {
            return Err(PatchError::MissingFile(region.surface().into()));
        }
        Ok(())
    }

    fn reverse(&self, call: &'static str) -> Result<(), PatchError> {
        self.calls.borrow_mut().push(call);
        if self.failing_reverse {
            return Err(PatchError::Malformed {
                file: "fake".to_string(),
                reason: "reverse failed".to_string(),
            });
        }
        Ok(())
    }
}

impl ModPatcher for FakePatcher {
    fn install_menus(&self, _m: &mut Mod) -> Result<(), PatchError> {
        self.apply("install_menus", Region::Menus)
    }

    fn uninstall_menus(&self, _m: &mut Mod) -> Result<(), PatchError> {
        self.reverse("uninstall_menus")
    }

    fn install_xml_keys(&self, _m: &mut Mod) -> Result<(), PatchError> {
        self.apply("install_xml_keys", Region::XmlKeys)
    }

    fn uninstall_xml_keys(&self, _m: &mut Mod) -> Result<(), PatchError> {
        self.reverse("uninstall_xml_keys")
    }

    fn install_input_keys(&self, _m: &mut Mod) -> Result<(usize, usize), PatchError> {
        self.apply("install_input_keys", Region::InputKeys)?;
        Ok((2, 1))
    }

    fn uninstall_input_keys(&self, _m: &mut Mod) -> Result<(), PatchError> {
        self.reverse("uninstall_input_keys")
    }

    fn install_user_settings(&self, _m: &mut Mod) -> Result<(), PatchError> {
        self.apply("install_user_settings", Region::UserSettings)
    }

    fn uninstall_user_settings(&self, _m: &mut Mod) -> Result<(), PatchError> {
        self.reverse("uninstall_user_settings")
    }

    fn check_priority(&self, _m: &mut Mod) {
        self.calls.borrow_mut().push("check_priority");
    }

    fn enable(&self, m: &mut Mod) -> Result<Vec<Region>, PatchError> {
        self.calls.borrow_mut().push("enable");
        m.enabled = true;
        Ok(Region::INSTALL_ORDER
            .into_iter()
            .filter(|r| self.failing.contains(r))
            .collect())
    }

    fn disable(&self, m: &mut Mod) -> Result<(), PatchError> {
        self.reverse("disable")?;
        m.enabled = false;
        Ok(())
    }
}

//! Install, uninstall and reinstall orchestration
//!
//! An [`Installer`] is one run: the conflict "ask again?" state it carries
//! applies to every source installed through it.

mod fsops;
mod install;
mod patch;
mod uninstall;

#[cfg(test)]
pub(crate) mod testing;

pub use fsops::{copy_folder, is_within, remove_folder, ScratchGuard};
pub use patch::{run_install_patches, run_reinstall_patches, PatchReport};

use crate::config::InstallPaths;
use crate::model::Model;
use crate::mods::{AskPolicy, ConflictPrompt, ContentClassifier, Fetcher, ModPatcher};

/// Result of one install attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallSummary {
    pub success: bool,
    /// Folders copied into the mods/DLC roots
    pub installed: usize,
    /// 1 when some config region could not be applied
    pub incomplete: usize,
}

impl InstallSummary {
    /// Attempt refused before touching anything
    pub const fn rejected() -> Self {
        Self {
            success: false,
            installed: 0,
            incomplete: 0,
        }
    }
}

/// Result of a reinstall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReinstallOutcome {
    pub success: bool,
    pub incomplete: bool,
}

type ProgressSink<'a> = Box<dyn FnMut(f32) + 'a>;
type OutputSink<'a> = Box<dyn FnMut(&str) + 'a>;

/// Drives mod installs against the game folders and the registry
pub struct Installer<'a> {
    model: &'a mut Model,
    paths: &'a InstallPaths,
    fetcher: &'a dyn Fetcher,
    patcher: &'a dyn ModPatcher,
    prompt: &'a mut dyn ConflictPrompt,
    classifier: ContentClassifier,
    policy: AskPolicy,
    progress: ProgressSink<'a>,
    output: OutputSink<'a>,
}

impl<'a> Installer<'a> {
    pub fn new(
        model: &'a mut Model,
        paths: &'a InstallPaths,
        fetcher: &'a dyn Fetcher,
        patcher: &'a dyn ModPatcher,
        prompt: &'a mut dyn ConflictPrompt,
    ) -> Self {
        Self {
            model,
            paths,
            fetcher,
            patcher,
            prompt,
            classifier: ContentClassifier::default(),
            policy: AskPolicy::default(),
            progress: Box::new(|_| {}),
            output: Box::new(|_| {}),
        }
    }

    pub fn with_classifier(mut self, classifier: ContentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Progress in `0.0..=1.0` for the current attempt
    pub fn on_progress(mut self, progress: impl FnMut(f32) + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// User-facing output lines
    pub fn on_output(mut self, output: impl FnMut(&str) + 'a) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn policy(&self) -> &AskPolicy {
        &self.policy
    }

    pub fn model(&self) -> &Model {
        self.model
    }

    fn emit(&mut self, line: &str) {
        tracing::info!("{}", line);
        (self.output)(line);
    }

    fn report(&mut self, value: f32) {
        (self.progress)(value);
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakePatcher;
    use super::*;
    use crate::mods::{
        ArchiveFetcher, ConflictDecision, FixedAnswer, MockConflictPrompt, Mod, Region,
    };
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        paths: InstallPaths,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let settings = tmp.path().join("settings");
            fs::create_dir_all(&settings).unwrap();
            let paths = InstallPaths::for_game(
                &tmp.path().join("game"),
                &settings,
                &tmp.path().join("scratch"),
            );
            Self { tmp, paths }
        }

        fn mods(&self) -> &Path {
            self.paths.mods.as_deref().unwrap()
        }

        fn dlc(&self) -> &Path {
            self.paths.dlc.as_deref().unwrap()
        }

        fn menu(&self) -> &Path {
            self.paths.menu.as_deref().unwrap()
        }

        /// A loose mod source holding the given folders, each with game data
        fn source(&self, name: &str, folders: &[&str]) -> PathBuf {
            let source = self.tmp.path().join("downloads").join(name);
            for folder in folders {
                write(&source.join(folder).join("content/blob0.bundle"), name);
            }
            fs::create_dir_all(&source).unwrap();
            source
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    struct Run {
        summary: InstallSummary,
        output: Vec<String>,
        progress: Vec<f32>,
    }

    fn install(
        fixture: &Fixture,
        model: &mut Model,
        patcher: &dyn ModPatcher,
        prompt: &mut dyn ConflictPrompt,
        source: &Path,
    ) -> Run {
        let fetcher = ArchiveFetcher::default();
        let mut output = Vec::new();
        let mut progress = Vec::new();
        let summary = {
            let mut installer = Installer::new(model, &fixture.paths, &fetcher, patcher, prompt)
                .on_output(|line| output.push(line.to_string()))
                .on_progress(|value| progress.push(value));
            installer.install_mod(source)
        };
        Run {
            summary,
            output,
            progress,
        }
    }

    #[test]
    fn source_inside_game_is_rejected_untouched() {
        let fixture = Fixture::new();
        let inside = fixture.mods().join("modAlready");
        write(&inside.join("content/blob0.bundle"), "x");
        write(&fixture.paths.extracted.join("leftover.txt"), "x");
        let mut model = Model::new();

        let run = install(
            &fixture,
            &mut model,
            &FakePatcher::default(),
            &mut FixedAnswer(ConflictDecision::Yes),
            &inside,
        );

        assert_eq!(run.summary, InstallSummary::rejected());
        assert!(model.is_empty());
        assert!(run.progress.is_empty());
        assert!(inside.join("content/blob0.bundle").exists());
        assert!(fixture.paths.extracted.join("leftover.txt").exists());
    }

    #[test]
    fn installs_every_classified_folder() {
        let fixture = Fixture::new();
        let source = fixture.source("BetterTorches-12-1-0", &["modTorches", "modTorchesPatch", "dlc/dlcTorches"]);
        let mut model = Model::new();
        let patcher = FakePatcher::default();

        let run = install(
            &fixture,
            &mut model,
            &patcher,
            &mut FixedAnswer(ConflictDecision::No),
            &source,
        );

        assert_eq!(
            run.summary,
            InstallSummary {
                success: true,
                installed: 3,
                incomplete: 0
            }
        );
        assert!(fixture.mods().join("modTorches/content/blob0.bundle").exists());
        assert!(fixture.mods().join("modTorchesPatch").is_dir());
        assert!(fixture.dlc().join("dlcTorches/content").is_dir());
        assert_eq!(run.output[0], "Installing BetterTorches");
        assert_eq!(model.len(), 1);
        let entry = model.get("BetterTorches-12-1-0").unwrap();
        assert_eq!(entry.files.len(), 2);
        assert_eq!(entry.date.len(), "2024-01-01 00:00:00".len());

        assert_eq!(run.progress.first(), Some(&0.1));
        assert_eq!(run.progress.last(), Some(&1.0));
        assert!(run.progress.windows(2).all(|w| w[0] <= w[1]));
        assert!(!fixture.paths.extracted.exists());
    }

    #[test]
    fn repeated_install_keeps_one_registry_entry() {
        let fixture = Fixture::new();
        let source = fixture.source("modRepeat", &[]);
        write(&source.join("content/blob0.bundle"), "x");
        let mut model = Model::new();
        let patcher = FakePatcher::default();
        let mut prompt = FixedAnswer(ConflictDecision::YesToAll);

        for _ in 0..3 {
            let run = install(&fixture, &mut model, &patcher, &mut prompt, &source);
            assert!(run.summary.success);
            assert_eq!(run.summary.installed, 1);
        }
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn failing_region_counts_one_incomplete() {
        let fixture = Fixture::new();
        let source = fixture.source("Partial", &["modPartial"]);
        let mut model = Model::new();
        let patcher = FakePatcher::failing(&[Region::Menus, Region::UserSettings]);

        let run = install(
            &fixture,
            &mut model,
            &patcher,
            &mut FixedAnswer(ConflictDecision::Yes),
            &source,
        );

        assert_eq!(
            run.summary,
            InstallSummary {
                success: true,
                installed: 1,
                incomplete: 1
            }
        );
        assert!(run
            .output
            .contains(&"Note: Additions to menu xml files could not be automatically installed.".to_string()));
        assert!(run
            .output
            .contains(&"Note: Additions to user.settings could not be automatically installed.".to_string()));
        assert!(patcher.calls().contains(&"check_priority"));
    }

    #[test]
    fn empty_mod_is_rolled_back() {
        let fixture = Fixture::new();
        let source = fixture.source("MenuOnly", &[]);
        write(
            &source.join("bin/config/r4game/user_config_matrix/pc/modMenuOnly.xml"),
            "<UserConfig/>",
        );
        let mut model = Model::new();

        let run = install(
            &fixture,
            &mut model,
            &FakePatcher::default(),
            &mut FixedAnswer(ConflictDecision::Yes),
            &source,
        );

        assert!(!run.summary.success);
        assert_eq!(run.summary.installed, 0);
        assert!(run
            .output
            .contains(&"Error: No data found in 'MenuOnly'".to_string()));
        assert!(run.output.contains(&"Uninstalling MenuOnly".to_string()));
        assert!(!fixture.menu().join("modMenuOnly.xml").exists());
        assert!(model.is_empty());
    }

    #[test]
    fn missing_mods_root_aborts_before_copying() {
        let mut fixture = Fixture::new();
        fixture.paths.mods = None;
        let source = fixture.source("NoRoot", &["modNoRoot"]);
        let mut model = Model::new();

        let run = install(
            &fixture,
            &mut model,
            &FakePatcher::default(),
            &mut FixedAnswer(ConflictDecision::Yes),
            &source,
        );

        assert!(!run.summary.success);
        assert!(run
            .output
            .contains(&"Error: Mods folder does not exist and could not be created.".to_string()));
        assert!(model.is_empty());
    }

    #[test]
    fn abort_after_copy_removes_copied_folders() {
        let mut fixture = Fixture::new();
        fixture.paths.menu = None;
        let source = fixture.source("Copied", &["modCopied", "dlc/dlcCopied"]);
        write(
            &source.join("bin/config/r4game/user_config_matrix/pc/modCopied.xml"),
            "<UserConfig/>",
        );
        let mut model = Model::new();
        let patcher = FakePatcher::default();

        let run = install(
            &fixture,
            &mut model,
            &patcher,
            &mut FixedAnswer(ConflictDecision::Yes),
            &source,
        );

        assert!(!run.summary.success);
        assert_eq!(run.summary.installed, 0);
        assert!(run
            .output
            .contains(&"Error: Menu folder does not exist and could not be created.".to_string()));
        assert!(run.output.contains(&"Uninstalling Copied".to_string()));
        assert!(!fixture.mods().join("modCopied").exists());
        assert!(!fixture.dlc().join("dlcCopied").exists());
        assert!(model.is_empty());
        assert!(!patcher.calls().contains(&"install_menus"));
    }

    #[test]
    fn archive_scratch_is_removed_after_failure() {
        use std::io::Write;

        let fixture = Fixture::new();
        let archive = fixture.tmp.path().join("Nothing.zip");
        {
            let file = fs::File::create(&archive).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("notes.md", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"nothing to see").unwrap();
            zip.finish().unwrap();
        }
        let mut model = Model::new();

        let run = install(
            &fixture,
            &mut model,
            &FakePatcher::default(),
            &mut FixedAnswer(ConflictDecision::Yes),
            &archive,
        );
        assert!(!run.summary.success);
        assert!(!fixture.paths.extracted.exists());
    }

    #[test]
    fn no_to_all_skips_every_later_conflict() {
        let fixture = Fixture::new();
        write(&fixture.mods().join("modA/content/old.bundle"), "old");
        write(&fixture.mods().join("modB/content/old.bundle"), "old");
        let source = fixture.source("Both", &["modA", "modB", "modC"]);
        let mut model = Model::new();

        let mut prompt = MockConflictPrompt::new();
        prompt
            .expect_ask()
            .times(1)
            .returning(|_, _| ConflictDecision::NoToAll);

        let fetcher = ArchiveFetcher::default();
        let patcher = FakePatcher::default();
        let mut installer = Installer::new(&mut model, &fixture.paths, &fetcher, &patcher, &mut prompt);
        let summary = installer.install_mod(&source);

        assert!(summary.success);
        assert_eq!(summary.installed, 1);
        assert!(!installer.policy().ask);
        assert!(fixture.mods().join("modA/content/old.bundle").exists());
        assert!(fixture.mods().join("modC/content/blob0.bundle").exists());
    }

    #[test]
    fn yes_to_all_persists_across_sources() {
        let fixture = Fixture::new();
        write(&fixture.mods().join("modA/content/old.bundle"), "old");
        write(&fixture.dlc().join("dlcB/content/old.bundle"), "old");
        let first = fixture.source("First", &["modA"]);
        let second = fixture.source("Second", &["dlc/dlcB"]);
        let mut model = Model::new();

        let mut prompt = MockConflictPrompt::new();
        prompt
            .expect_ask()
            .times(1)
            .returning(|_, _| ConflictDecision::YesToAll);

        let fetcher = ArchiveFetcher::default();
        let patcher = FakePatcher::default();
        let mut installer = Installer::new(&mut model, &fixture.paths, &fetcher, &patcher, &mut prompt);
        assert_eq!(installer.install_mod(&first).installed, 1);
        assert_eq!(installer.install_mod(&second).installed, 1);
        assert!(!fixture.mods().join("modA/content/old.bundle").exists());
        assert!(fixture.dlc().join("dlcB/content/blob0.bundle").exists());
    }

    #[test]
    fn unknown_data_folder_is_reported() {
        let fixture = Fixture::new();
        let source = fixture.source("Odd", &["modOdd", "Extras"]);
        let mut model = Model::new();

        let run = install(
            &fixture,
            &mut model,
            &FakePatcher::default(),
            &mut FixedAnswer(ConflictDecision::Yes),
            &source,
        );
        assert!(run.summary.success);
        assert_eq!(run.summary.installed, 1);
        assert!(run.output.contains(
            &"Detected data folder but could not recognize it as part of a mod or dlc: Extras"
                .to_string()
        ));
    }

    fn installed_mod(fixture: &Fixture) -> Mod {
        let mut m = Mod::new("Shipped.zip");
        m.files.insert("modShipped".to_string());
        m.dlcs.insert("dlcShipped".to_string());
        m.menus.insert("modShipped.xml".to_string());
        m.menus.insert("input.xml".to_string());
        write(&fixture.mods().join("modShipped/content/a.bundle"), "x");
        write(&fixture.dlc().join("dlcShipped/content/a.bundle"), "x");
        write(&fixture.menu().join("modShipped.xml"), "<UserConfig/>");
        write(&fixture.menu().join("input.xml"), "<UserConfig/>");
        m
    }

    #[test]
    fn uninstall_removes_content_but_not_protected_menus() {
        let fixture = Fixture::new();
        let m = installed_mod(&fixture);
        let mut model = Model::from_mods(vec![m]);
        let fetcher = ArchiveFetcher::default();
        let patcher = FakePatcher::default();
        let mut prompt = FixedAnswer(ConflictDecision::Yes);
        let mut output = Vec::new();

        let removed = {
            let mut installer = Installer::new(&mut model, &fixture.paths, &fetcher, &patcher, &mut prompt)
                .on_output(|line| output.push(line.to_string()));
            installer.uninstall_named("Shipped.zip").unwrap()
        };

        assert!(removed);
        assert!(model.is_empty());
        assert!(!fixture.mods().join("modShipped").exists());
        assert!(!fixture.dlc().join("dlcShipped").exists());
        assert!(!fixture.menu().join("modShipped.xml").exists());
        assert!(fixture.menu().join("input.xml").exists());
        assert!(output.contains(&"Note: Additions to input.xml will not be removed.".to_string()));
        assert_eq!(
            patcher.calls(),
            vec![
                "uninstall_menus",
                "uninstall_xml_keys",
                "uninstall_user_settings",
                "uninstall_input_keys"
            ]
        );
    }

    #[test]
    fn failed_uninstall_keeps_registry_entry() {
        let fixture = Fixture::new();
        let m = installed_mod(&fixture);
        let mut model = Model::from_mods(vec![m]);
        let fetcher = ArchiveFetcher::default();
        let patcher = FakePatcher::default().with_failing_reverse();
        let mut prompt = FixedAnswer(ConflictDecision::Yes);

        let mut installer = Installer::new(&mut model, &fixture.paths, &fetcher, &patcher, &mut prompt);
        assert!(!installer.uninstall_named("Shipped.zip").unwrap());
        assert_eq!(installer.model().len(), 1);
        assert!(fixture.mods().join("modShipped").exists());
        assert!(installer.uninstall_named("Unknown.zip").is_err());
    }

    #[test]
    fn disabled_mod_is_enabled_before_uninstall() {
        let fixture = Fixture::new();
        let mut m = installed_mod(&fixture);
        m.enabled = false;
        let mut model = Model::from_mods(vec![m]);
        let fetcher = ArchiveFetcher::default();
        let patcher = FakePatcher::failing(&[Region::XmlKeys]);
        let mut prompt = FixedAnswer(ConflictDecision::Yes);
        let mut output = Vec::new();

        {
            let mut installer = Installer::new(&mut model, &fixture.paths, &fetcher, &patcher, &mut prompt)
                .on_output(|line| output.push(line.to_string()));
            assert!(installer.uninstall_named("Shipped.zip").unwrap());
        }
        assert_eq!(patcher.calls()[0], "enable");
        assert!(output
            .contains(&"Note: Additions to input.xml could not be automatically installed.".to_string()));
    }

    #[test]
    fn reinstall_reports_incomplete_regions() {
        let fixture = Fixture::new();
        let m = installed_mod(&fixture);
        let mut model = Model::from_mods(vec![m]);
        let fetcher = ArchiveFetcher::default();
        let patcher = FakePatcher::failing(&[Region::InputKeys]);
        let mut prompt = FixedAnswer(ConflictDecision::Yes);

        let mut installer = Installer::new(&mut model, &fixture.paths, &fetcher, &patcher, &mut prompt);
        let outcome = installer.reinstall_named("Shipped.zip").unwrap();
        assert_eq!(
            outcome,
            ReinstallOutcome {
                success: true,
                incomplete: true
            }
        );

        drop(installer);

        let broken = FakePatcher::default().with_failing_reverse();
        let mut installer = Installer::new(&mut model, &fixture.paths, &fetcher, &broken, &mut prompt);
        assert_eq!(
            installer.reinstall_named("Shipped.zip").unwrap(),
            ReinstallOutcome {
                success: false,
                incomplete: false
            }
        );
    }

    #[test]
    fn disable_and_enable_follow_registry_flag() {
        let fixture = Fixture::new();
        let m = installed_mod(&fixture);
        let mut model = Model::from_mods(vec![m]);
        let fetcher = ArchiveFetcher::default();
        let patcher = FakePatcher::default();
        let mut prompt = FixedAnswer(ConflictDecision::Yes);

        let mut installer = Installer::new(&mut model, &fixture.paths, &fetcher, &patcher, &mut prompt);
        assert!(installer.disable_named("Shipped.zip").unwrap());
        assert!(!installer.model().get("Shipped.zip").unwrap().enabled);
        assert!(installer.enable_named("Shipped.zip").unwrap());
        assert!(installer.model().get("Shipped.zip").unwrap().enabled);
        assert_eq!(patcher.calls(), vec!["disable", "enable"]);
    }
}

// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Runs the whole corpus preparation in order:
//
//   Step 1: Validate config                        (Layer 2)
//   Step 2: Per dialogue source                    (Layer 4)
//             load subsets → format → scan → clean
//             → scan → dedup (policy) → split or keep
//             predefined subsets → save
//   Step 3: Merge dialogue partitions + shuffle    (Layer 4)
//             save merged JSON and model text      (Layer 6)
//   Step 4: Per instruction source                 (Layer 4)
//             load → difficulty tags → format → scan
//             → clean → scan → dedup → split
//   Step 5: Save instruction partitions            (Layer 6)
//   Step 6: Combined dialogue + instruction lists  (Layer 4/6)
//
// Any validation or structural error stops the run. Per-record
// problems are logged by the stage that hits them and show up
// only as counts in the summary.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use crate::application::cleaning::{clean_dialogues, clean_instructions};
use crate::application::config::{
    DialogueSourceConfig, InstructionSourceConfig, PrepareConfig, PARTITIONS, TEST, TRAIN,
    VALIDATION,
};
use crate::data::{
    dedup::Deduplicator,
    difficulty::DifficultyMerger,
    formatter::{DialogueFormatter, InstructionFormatter},
    loader::JsonLoader,
    merger::DatasetMerger,
    model_formatter::{DialogueModelFormatter, InstructionModelFormatter},
    normalizer::{CleaningPatterns, TextNormalizer},
    scanner::{IssueScanner, ScanPatterns},
    splitter::{DataSplitter, SplitResult},
};
use crate::domain::error::PrepError;
use crate::domain::issue::IssueCount;
use crate::domain::record::{CanonicalRecord, DialogueRecord, InstructionRecord};
use crate::domain::traits::{ModelFormatter, RecordFormatter, TextUnits};
use crate::infra::{output_store::OutputStore, scan_report::ScanReportLogger};

/// Subset label for instruction sources, which are split after cleaning.
const ALL_RECORDS: &str = "all";

// ─── Summary ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionCounts {
    pub train:      usize,
    pub validation: usize,
    pub test:       usize,
}

impl PartitionCounts {
    fn of<T>(train: &[T], validation: &[T], test: &[T]) -> Self {
        Self { train: train.len(), validation: validation.len(), test: test.len() }
    }

    pub fn total(&self) -> usize {
        self.train + self.validation + self.test
    }
}

impl<T> From<&SplitResult<T>> for PartitionCounts {
    fn from(s: &SplitResult<T>) -> Self {
        Self::of(&s.train, &s.validation, &s.test)
    }
}

impl fmt::Display for PartitionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "train={} validation={} test={}", self.train, self.validation, self.test)
    }
}

/// What happened to one source on its way through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSummary {
    pub name:       String,
    /// Canonical records produced by the formatter
    pub formatted:  usize,
    /// Records emptied by cleaning
    pub dropped:    usize,
    pub duplicates: usize,
    pub partitions: PartitionCounts,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepareSummary {
    pub dialogue_sources:    Vec<SourceSummary>,
    pub instruction_sources: Vec<SourceSummary>,
    pub merged:              PartitionCounts,
    pub instruction:         PartitionCounts,
    pub combined:            Option<PartitionCounts>,
}

impl fmt::Display for PrepareSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in self.dialogue_sources.iter().chain(&self.instruction_sources) {
            writeln!(
                f,
                "  {:<20} formatted={} dropped={} duplicates={} | {}",
                s.name, s.formatted, s.dropped, s.duplicates, s.partitions
            )?;
        }
        writeln!(f, "  merged dialogue      {}", self.merged)?;
        writeln!(f, "  instruction          {}", self.instruction)?;
        if let Some(c) = &self.combined {
            writeln!(f, "  combined             {c}")?;
        }
        Ok(())
    }
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PrepareSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate before touching any data ─────────────────────────
        cfg.validate().context("Invalid configuration")?;

        let store  = OutputStore::new(&cfg.output.base_dir)?;
        let report = if cfg.scanning.enabled {
            Some(ScanReportLogger::new(store.base_dir())?)
        } else {
            None
        };
        let ctx = RunContext {
            loader:   JsonLoader::new(),
            store,
            report,
            splitter: DataSplitter::new(cfg.splitting.random_state),
            dedup:    Deduplicator::new(),
        };
        let merger      = DatasetMerger::new();
        let mut summary = PrepareSummary::default();

        tracing::info!("Starting preprocessing pipeline...");

        // ── Step 2: Dialogue sources ──────────────────────────────────────────
        let mut train_groups = Vec::new();
        let mut val_groups   = Vec::new();
        let mut test_groups  = Vec::new();

        for source in &cfg.dialogue_sources {
            let (split, source_summary) = self
                .process_dialogue_source(source, &ctx)
                .with_context(|| format!("Dialogue source '{}' failed", source.name))?;

            summary.dialogue_sources.push(source_summary);
            let (train, validation, test) = split.into_parts();
            train_groups.push(train);
            val_groups.push(validation);
            test_groups.push(test);
        }

        // ── Step 3: Merge dialogue partitions ─────────────────────────────────
        let (merged_train, merged_val, merged_test) =
            merger.merge_and_shuffle(train_groups, val_groups, test_groups);
        summary.merged = PartitionCounts::of(&merged_train, &merged_val, &merged_test);

        if cfg.dialogue_sources.is_empty() {
            tracing::info!("No dialogue datasets configured.");
        } else {
            tracing::info!("Merging datasets: {}", summary.merged);
            for (name, data) in [(TRAIN, &merged_train), (VALIDATION, &merged_val), (TEST, &merged_test)] {
                let path = ctx.store.json_path(&cfg.output.merged, name);
                ctx.store.save_json(data, &path)?;
                tracing::info!("Saved merged {}: {} dialogues → {}", name, data.len(), path.display());

                let text = DialogueModelFormatter.format_for_model(data);
                let path = ctx.store.text_path(&cfg.output.formatted, name);
                ctx.store.save_text(&text, &path)?;
                tracing::info!("Saved formatted {} → {}", name, path.display());
            }
        }

        // ── Step 4: Instruction sources ───────────────────────────────────────
        let mut instruction = SplitResult::default();

        if cfg.instruction_sources.is_empty() {
            tracing::info!("No instruction datasets configured.");
        }
        for source in &cfg.instruction_sources {
            let (split, source_summary) = self
                .process_instruction_source(source, &ctx)
                .with_context(|| format!("Instruction source '{}' failed", source.name))?;

            summary.instruction_sources.push(source_summary);
            instruction.train.extend(split.train);
            instruction.validation.extend(split.validation);
            instruction.test.extend(split.test);
        }
        summary.instruction = PartitionCounts::from(&instruction);

        // ── Step 5: Save instruction partitions ───────────────────────────────
        for (name, data) in [
            (TRAIN, &instruction.train),
            (VALIDATION, &instruction.validation),
            (TEST, &instruction.test),
        ] {
            if data.is_empty() {
                continue;
            }
            let path = ctx.store.json_path(&cfg.output.instruction, name);
            ctx.store.save_json(data, &path)?;
            tracing::info!("Saved instruction {}: {} → {}", name, data.len(), path.display());

            let text = InstructionModelFormatter.format_for_model(data);
            let path = ctx.store.text_path(&cfg.output.formatted_instruction, name);
            ctx.store.save_text(&text, &path)?;
        }

        // ── Step 6: Combined lists ────────────────────────────────────────────
        if cfg.merging.include_instruction {
            tracing::info!("Merging instruction data with dialogue data...");
            let (i_train, i_val, i_test) = instruction.into_parts();

            let combined_train = merger.merge_lists(vec![canonical(merged_train), canonical(i_train)]);
            let combined_val   = merger.merge_lists(vec![canonical(merged_val),   canonical(i_val)]);
            let combined_test  = merger.merge_lists(vec![canonical(merged_test),  canonical(i_test)]);

            for (name, data) in [(TRAIN, &combined_train), (VALIDATION, &combined_val), (TEST, &combined_test)] {
                let path = ctx.store.json_path(&cfg.output.combined, name);
                ctx.store.save_json(data, &path)?;
                tracing::info!("Saved combined {}: {} → {}", name, data.len(), path.display());
            }
            summary.combined = Some(PartitionCounts::of(&combined_train, &combined_val, &combined_test));
        }

        tracing::info!("Preprocessing completed successfully.");
        Ok(summary)
    }

    fn process_dialogue_source(
        &self,
        source: &DialogueSourceConfig,
        ctx:    &RunContext,
    ) -> Result<(SplitResult<DialogueRecord>, SourceSummary)> {
        let cfg       = &self.config;
        let formatter = DialogueFormatter::new(&source.name, source.dialogue_format()?);
        let cleaner   = TextNormalizer::new(CleaningPatterns::default());
        let scanner   = IssueScanner::new(ScanPatterns::default()).verbose(cfg.scanning.verbose);
        let mut summary = SourceSummary { name: source.name.clone(), ..Default::default() };

        tracing::info!("Loading {}", source.name);
        let mut subsets = ctx.loader.load_subsets(Path::new(&source.path))?;

        let mut prepared: BTreeMap<String, Vec<DialogueRecord>> = BTreeMap::new();
        for subset in source.subsets_to_process() {
            let raw = subsets.remove(&subset).ok_or_else(|| PrepError::MissingSubset {
                source_name: source.name.clone(),
                subset:      subset.clone(),
            })?;

            let dialogues = formatter.format_records(&raw)?;
            summary.formatted += dialogues.len();

            let before  = self.audit(&scanner, &dialogues, &source.name, &subset, "BEFORE");
            let cleaned = clean_dialogues(&cleaner, dialogues);
            let after   = self.audit(&scanner, &cleaned.records, &source.name, &subset, "AFTER");
            ctx.record_scan(&source.name, &subset, before, after)?;
            summary.dropped += cleaned.dropped_records;

            let mut dialogues = cleaned.records;
            if cfg.dedup.dialogue {
                let total = dialogues.len();
                dialogues = ctx.dedup.dedupe(dialogues, &cfg.dedup.dialogue_keys);
                summary.duplicates += total - dialogues.len();
            }
            prepared.insert(subset, dialogues);
        }

        let split = if source.resplit {
            let records = prepared.remove(&source.split_subset).unwrap_or_default();
            ctx.splitter.split(
                records,
                cfg.splitting.test_size,
                cfg.splitting.val_ratio_of_test,
            )?
        } else {
            SplitResult {
                train:      prepared.remove(TRAIN).unwrap_or_default(),
                validation: prepared.remove(VALIDATION).unwrap_or_default(),
                test:       prepared.remove(TEST).unwrap_or_default(),
            }
        };

        // Extra predefined subsets are written out but not merged
        for (name, data) in &prepared {
            let path = ctx.store.json_path(&source.output_prefix, name);
            ctx.store.save_json(data, &path)?;
            tracing::info!("Saved {}: {} dialogues → {}", name, data.len(), path.display());
        }
        for (name, data) in PARTITIONS.iter().zip([&split.train, &split.validation, &split.test]) {
            let path = ctx.store.json_path(&source.output_prefix, name);
            ctx.store.save_json(data, &path)?;
            tracing::info!("Saved {}: {} dialogues → {}", name, data.len(), path.display());
        }

        summary.partitions = PartitionCounts::from(&split);
        Ok((split, summary))
    }

    fn process_instruction_source(
        &self,
        source: &InstructionSourceConfig,
        ctx:    &RunContext,
    ) -> Result<(SplitResult<InstructionRecord>, SourceSummary)> {
        let cfg         = &self.config;
        let mut summary = SourceSummary { name: source.name.clone(), ..Default::default() };

        tracing::info!("Processing local file: {}", source.path);
        let raw = ctx.loader.load_records(Path::new(&source.path))?;
        if raw.is_empty() {
            tracing::warn!("Skipping empty file: {}", source.path);
            return Ok((SplitResult::default(), summary));
        }

        // Difficulty tags must survive cleaning and stay out of the scan
        let (raw, protected) = match &source.difficulty_file {
            Some(file) => {
                let labels    = ctx.loader.load_labels(Path::new(file))?;
                let annotated = DifficultyMerger::new().merge(raw, &labels);
                (annotated.records, annotated.tags)
            }
            None => (raw, BTreeSet::new()),
        };

        let cleaner = TextNormalizer::new(
            CleaningPatterns::default().with_protected(protected.iter().cloned()),
        );
        let scanner = IssueScanner::new(ScanPatterns::default().with_protected(protected.iter().cloned()))
            .verbose(cfg.scanning.verbose);

        let records = InstructionFormatter::new(&source.name).format_records(&raw)?;
        summary.formatted = records.len();

        let before  = self.audit(&scanner, &records, &source.name, ALL_RECORDS, "BEFORE");
        let cleaned = clean_instructions(&cleaner, records, &protected);
        let after   = self.audit(&scanner, &cleaned.records, &source.name, ALL_RECORDS, "AFTER");
        ctx.record_scan(&source.name, ALL_RECORDS, before, after)?;
        summary.dropped = cleaned.dropped_records;

        let mut records = cleaned.records;
        if cfg.dedup.instruction {
            let total = records.len();
            records = ctx.dedup.dedupe(records, &cfg.dedup.instruction_keys);
            summary.duplicates = total - records.len();
        }

        let split = ctx.splitter.split(
            records,
            cfg.splitting.instruction_test_size,
            cfg.splitting.val_ratio_of_test,
        )?;
        summary.partitions = PartitionCounts::from(&split);
        Ok((split, summary))
    }

    /// Scan when scanning is enabled; `None` otherwise.
    fn audit<R: TextUnits>(
        &self,
        scanner: &IssueScanner,
        records: &[R],
        dataset: &str,
        subset:  &str,
        stage:   &str,
    ) -> Option<IssueCount> {
        if !self.config.scanning.enabled {
            return None;
        }
        tracing::info!("[SCAN] Scanning {dataset} '{subset}' {stage} cleaning...");
        Some(scanner.scan_records(records))
    }
}

/// Collaborators shared by every source in one run.
struct RunContext {
    loader:   JsonLoader,
    store:    OutputStore,
    report:   Option<ScanReportLogger>,
    splitter: DataSplitter,
    dedup:    Deduplicator,
}

impl RunContext {
    fn record_scan(
        &self,
        dataset: &str,
        subset:  &str,
        before:  Option<IssueCount>,
        after:   Option<IssueCount>,
    ) -> Result<()> {
        let (Some(before), Some(after), Some(report)) = (before, after, &self.report) else {
            return Ok(());
        };
        tracing::info!("[SCAN] {dataset}/{subset} issues before: {before}");
        tracing::info!("[SCAN] {dataset}/{subset} issues after:  {after}");
        report.log(dataset, subset, &before, &after)
    }
}

fn canonical<R: Into<CanonicalRecord>>(records: Vec<R>) -> Vec<CanonicalRecord> {
    records.into_iter().map(Into::into).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::OutputConfig;
    use crate::data::formatter::RolePrefix;
    use crate::domain::record::Role;
    use serde_json::json;
    use std::fs;

    /// Writes a small corpus and returns a config pointing at it.
    fn fixture(root: &Path) -> PrepareConfig {
        let raw = root.join("raw");
        fs::create_dir_all(raw.join("daily")).unwrap();

        // persona: 20 dialogues in one "train" subset, re-split
        let persona: Vec<_> = (0..20)
            .map(|i| json!({"dialogue": [
                format!("User 1: hello number {i} — how are you"),
                format!("User 2: I’m fine <b>thanks</b> {i}"),
                "Narrator: ignored",
            ]}))
            .collect();
        fs::write(raw.join("persona.json"), json!({"train": persona}).to_string()).unwrap();

        // daily: predefined subsets, one file each
        for (subset, n) in [("train", 4), ("validation", 2), ("test", 2)] {
            let rows: Vec<_> = (0..n)
                .flat_map(|d| {
                    [0, 1].map(|t| json!({"dialog_id": format!("{subset}-{d}"), "utterance": format!("line {t} of {d}")}))
                })
                .collect();
            fs::write(raw.join("daily").join(format!("{subset}.json")), json!(rows).to_string()).unwrap();
        }

        // instructions: 30 unique + 1 duplicate + 1 blank; only the first
        // two get a label, the rest are tagged <unknown>
        let mut instr: Vec<_> = (0..30)
            .map(|i| json!({"instruction": format!("Question {i} ?"), "output": format!("Answer {i}.")}))
            .collect();
        instr.push(json!({"instruction": "Question 5 ?", "output": "Answer 5."}));
        instr.push(json!({"instruction": "   ", "output": "x"}));
        fs::write(raw.join("instr.json"), json!(instr).to_string()).unwrap();
        fs::write(raw.join("difficulty.json"), json!(["easy", "hard"]).to_string()).unwrap();

        let mut cfg = PrepareConfig::default();
        cfg.output = OutputConfig {
            base_dir: root.join("out").to_string_lossy().into_owned(),
            ..OutputConfig::default()
        };
        cfg.dialogue_sources[0].path = raw.join("persona.json").to_string_lossy().into_owned();
        cfg.dialogue_sources[1].path = raw.join("daily").to_string_lossy().into_owned();
        cfg.instruction_sources = vec![InstructionSourceConfig {
            name:            "instr".to_string(),
            path:            raw.join("instr.json").to_string_lossy().into_owned(),
            difficulty_file: Some(raw.join("difficulty.json").to_string_lossy().into_owned()),
        }];
        cfg
    }

    #[test]
    fn test_full_run_writes_every_output() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = fixture(dir.path());
        let out     = dir.path().join("out");
        let summary = PrepareUseCase::new(cfg).execute().unwrap();

        // persona re-split: 20 → holdout ceil(3.0) = 3 → validation 1, test 2
        let persona = &summary.dialogue_sources[0];
        assert_eq!(persona.formatted, 20);
        assert_eq!(persona.partitions, PartitionCounts { train: 17, validation: 1, test: 2 });

        // daily keeps its predefined subsets
        let daily = &summary.dialogue_sources[1];
        assert_eq!(daily.partitions, PartitionCounts { train: 4, validation: 2, test: 2 });
        assert_eq!(summary.merged, PartitionCounts { train: 21, validation: 3, test: 4 });

        // 32 raw → blank dropped by the formatter → 31 → one duplicate → 30
        let instr = &summary.instruction_sources[0];
        assert_eq!(instr.formatted, 31);
        assert_eq!(instr.duplicates, 1);
        assert_eq!(summary.instruction.total(), 30);

        let combined = summary.combined.unwrap();
        assert_eq!(combined.total(), summary.merged.total() + summary.instruction.total());

        for file in [
            "persona_train.json", "daily_validation.json", "merged_test.json",
            "formatted_train.txt", "instruction_train.json",
            "formatted_instruction_train.txt", "combined_train.json", "scan_report.csv",
        ] {
            assert!(out.join(file).exists(), "missing {file}");
        }
    }

    #[test]
    fn test_outputs_are_clean_and_tags_survive() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture(dir.path());
        let out = dir.path().join("out");
        PrepareUseCase::new(cfg).execute().unwrap();

        let merged: Vec<DialogueRecord> =
            serde_json::from_str(&fs::read_to_string(out.join("merged_train.json")).unwrap()).unwrap();
        for d in &merged {
            for t in &d.dialogue {
                assert!(!t.text.contains('<'), "tag left in {:?}", t.text);
                assert!(!t.text.contains('\u{2014}') && !t.text.contains('\u{2019}'));
            }
        }

        let mut instr: Vec<InstructionRecord> = Vec::new();
        for name in PARTITIONS {
            let path = out.join(format!("instruction_{name}.json"));
            if path.exists() {
                instr.extend(serde_json::from_str::<Vec<InstructionRecord>>(&fs::read_to_string(path).unwrap()).unwrap());
            }
        }
        let q0 = instr.iter().find(|r| r.output == "Answer 0.").unwrap();
        assert_eq!(q0.instruction, "<easy> Question 0?");
        let q5 = instr.iter().find(|r| r.output == "Answer 5.").unwrap();
        assert_eq!(q5.instruction, "<unknown> Question 5?");

        let text = fs::read_to_string(out.join("formatted_train.txt")).unwrap();
        assert!(text.lines().all(|l| l.is_empty() || l.starts_with("USER: ") || l.starts_with("BOT: ")));
    }

    #[test]
    fn test_seeded_partitions_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture(dir.path());
        let out = dir.path().join("out");

        PrepareUseCase::new(cfg.clone()).execute().unwrap();
        let first = fs::read_to_string(out.join("persona_test.json")).unwrap();
        PrepareUseCase::new(cfg).execute().unwrap();
        let second = fs::read_to_string(out.join("persona_test.json")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_config_stops_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = fixture(dir.path());
        cfg.splitting.test_size = 0.0;

        assert!(PrepareUseCase::new(cfg).execute().is_err());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_missing_subset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = fixture(dir.path());
        cfg.dialogue_sources[0].split_subset = "dev".to_string();

        let err = PrepareUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("no subset 'dev'"));
    }

    #[test]
    fn test_dialogue_dedup_policy() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("p.json");
        let same = json!({"dialogue": ["A: same words", "B: same reply"]});
        fs::write(&raw, json!({"train": [same.clone(), same.clone(), same]}).to_string()).unwrap();

        let mut cfg = PrepareConfig::default();
        cfg.output.base_dir = dir.path().join("out").to_string_lossy().into_owned();
        cfg.instruction_sources.clear();
        cfg.merging.include_instruction = false;
        cfg.dialogue_sources.truncate(1);
        let src = &mut cfg.dialogue_sources[0];
        src.path          = raw.to_string_lossy().into_owned();
        src.role_prefixes = vec![RolePrefix::new("A:", Role::User), RolePrefix::new("B:", Role::Bot)];

        let kept = PrepareUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(kept.merged.total(), 3);

        cfg.dedup.dialogue = true;
        let deduped = PrepareUseCase::new(cfg).execute().unwrap();
        assert_eq!(deduped.dialogue_sources[0].duplicates, 2);
        assert_eq!(deduped.merged.total(), 1);
        assert!(deduped.combined.is_none());
    }
}

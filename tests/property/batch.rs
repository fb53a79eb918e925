use proptest::prelude::*;
use packrun::launch::Launcher;
use packrun::types::{ArgumentBatch, ShellCommand};
use packrun_test_utils::builders::LaunchOptionsBuilder;
use packrun_test_utils::fake_backend::{FailingBackend, RecordingBackend};
use packrun_test_utils::fake_builder::RecordingBuilder;

// Entries are either bare (None / "") or a short space-free word.
fn batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<Option<String>>> {
    proptest::collection::vec(
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            "[a-z0-9-]{1,8}".prop_map(Some),
        ],
        1..=max_len,
    )
}

proptest! {
    #[test]
    fn batch_builds_once_and_dispatches_each_entry_in_order(entries in batch_strategy(12)) {
        packrun_test_utils::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::new(RecordingBuilder::new(dir.path()));
        let backend = RecordingBackend::new();
        let options = LaunchOptionsBuilder::new().capture().build();
        let batch = ArgumentBatch::new(entries.clone());

        let outs = launcher
            .run_commands(&ShellCommand::new("echo").unwrap(), &batch, &backend, &options)
            .unwrap();

        prop_assert_eq!(launcher.builder().builds().len(), 1);
        let artifact = launcher.builder().builds()[0].output.display().to_string();

        let expected_lines: Vec<String> = entries
            .iter()
            .map(|e| match e.as_deref() {
                Some(args) if !args.is_empty() => format!("{artifact} -- {args}"),
                _ => artifact.clone(),
            })
            .collect();
        prop_assert_eq!(backend.command_lines(), expected_lines);

        let expected_outs: Vec<Option<String>> = entries
            .iter()
            .map(|e| Some(e.clone().unwrap_or_default()))
            .collect();
        prop_assert_eq!(outs, expected_outs);
        prop_assert!(launcher.builder().residual_files().is_empty());
    }

    #[test]
    fn failure_stops_at_the_failing_entry(len in 1usize..10, fail_at in 0usize..10) {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::new(RecordingBuilder::new(dir.path()));
        let backend = FailingBackend::at(fail_at);
        let options = LaunchOptionsBuilder::new().build();

        let result = launcher.run_commands(
            &ShellCommand::new("true").unwrap(),
            &ArgumentBatch::bare(len),
            &backend,
            &options,
        );

        if fail_at < len {
            prop_assert!(result.is_err());
            prop_assert_eq!(backend.dispatched().len(), fail_at + 1);
        } else {
            prop_assert_eq!(result.unwrap().len(), len);
            prop_assert_eq!(backend.dispatched().len(), len);
        }
        prop_assert!(launcher.builder().residual_files().is_empty());
    }
}

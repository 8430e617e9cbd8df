use std::collections::HashSet;

use supersede_core::models::{Commit, RunId, WorkflowRun};

use crate::candidates::Candidates;

/// The commits a superseded run's head must fall within.
#[derive(Debug, Clone, Copy)]
pub enum CommitWindow<'a> {
    /// Commits strictly newer than the baseline, reachable from the current run's head.
    Bounded(&'a [Commit]),
    /// No ancestry limit: every candidate is considered.
    Unbounded,
}

/// Select the runs superseded by `current`: candidates whose head commit lies in `window`, that
/// are not completed, and that are not the current run itself.
///
/// The result follows `window` order (newest commit first) and holds each run at most once.
pub fn select_superseded(
    candidates: &Candidates,
    window: CommitWindow<'_>,
    current: RunId,
) -> Vec<WorkflowRun> {
    let in_window: Box<dyn Iterator<Item = &WorkflowRun> + '_> = match window {
        CommitWindow::Bounded(commits) => {
            Box::new(commits.iter().filter_map(|commit| candidates.get(&commit.sha)))
        }
        CommitWindow::Unbounded => Box::new(candidates.iter()),
    };
    in_window
        .filter(|run| !run.is_completed() && run.id != current)
        .fold((HashSet::new(), Vec::new()), |(mut seen, mut selected), run| {
            if seen.insert(run.id) {
                selected.push(run.clone());
            }
            (seen, selected)
        })
        .1
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use supersede_core::models::RunStatus;

    use super::*;
    use crate::testing::{commits, run};

    fn ids(runs: &[WorkflowRun]) -> Vec<u64> { runs.iter().map(|r| r.id.0).collect() }

    #[test]
    fn test_selects_reachable_incomplete_runs() {
        let candidates = Candidates::from_runs([
            run(1, "c4", RunStatus::Queued),
            run(2, "c3", RunStatus::Completed),
            run(3, "c1", RunStatus::Waiting),
        ]);
        let walked = commits(&["c5", "c4", "c3"]);
        let selected =
            select_superseded(&candidates, CommitWindow::Bounded(&walked), RunId(10));
        assert_eq!(ids(&selected), vec![1]);
    }

    #[test]
    fn test_never_selects_current_run() {
        let candidates = Candidates::from_runs([
            run(10, "c5", RunStatus::InProgress),
            run(4, "c4", RunStatus::Waiting),
        ]);
        let walked = commits(&["c5", "c4"]);
        let selected =
            select_superseded(&candidates, CommitWindow::Bounded(&walked), RunId(10));
        assert_eq!(ids(&selected), vec![4]);
        let selected = select_superseded(&candidates, CommitWindow::Unbounded, RunId(10));
        assert_eq!(ids(&selected), vec![4]);
    }

    #[test]
    fn test_unbounded_considers_every_candidate() {
        let candidates = Candidates::from_runs([
            run(4, "c4", RunStatus::Waiting),
            run(3, "c3", RunStatus::Completed),
            run(1, "c1", RunStatus::Queued),
        ]);
        let selected = select_superseded(&candidates, CommitWindow::Unbounded, RunId(10));
        assert_eq!(ids(&selected), vec![4, 1]);
    }

    fn arb_status() -> impl Strategy<Value = RunStatus> {
        prop_oneof![Just(RunStatus::Waiting), Just(RunStatus::Completed), Just(RunStatus::Queued)]
    }

    proptest! {
        #[test]
        fn selection_matches_set_definition(
            candidate_runs in prop::collection::vec((0u64..20, 0u8..30, arb_status()), 0..15),
            walked_shas in prop::collection::hash_set(0u8..30, 0..15),
            current in 0u64..20,
        ) {
            let candidates = Candidates::from_runs(
                candidate_runs
                    .iter()
                    .map(|&(id, sha, status)| run(id, &format!("s{sha}"), status)),
            );
            let walked = walked_shas
                .iter()
                .map(|sha| Commit { sha: format!("s{sha}") })
                .collect::<Vec<_>>();
            let selected =
                select_superseded(&candidates, CommitWindow::Bounded(&walked), RunId(current));

            let selected_ids = selected.iter().map(|r| r.id).collect::<HashSet<_>>();
            prop_assert_eq!(selected_ids.len(), selected.len());
            let walked_set = walked.iter().map(|c| c.sha.as_str()).collect::<HashSet<_>>();
            let expected = candidates
                .iter()
                .filter(|r| walked_set.contains(r.head_sha.as_str()))
                .filter(|r| !r.is_completed() && r.id != RunId(current))
                .map(|r| r.id)
                .collect::<HashSet<_>>();
            prop_assert_eq!(selected_ids, expected);
            prop_assert!(selected.iter().all(|r| r.id != RunId(current)));
        }
    }
}

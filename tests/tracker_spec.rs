use std::path::Path;

use speculate2::speculate;
use timetrack::models::*;
use timetrack::tracker::{SlotState, Tracker};
use timetrack::Error;

fn project_id(project: &Project) -> i64 {
    project.id.expect("Project should be saved")
}

/// Make every statement matching `event` on `table` fail, using a second
/// connection to the store at `path`.
fn reject_writes(path: &Path, event: &str, table: &str) {
    let conn = rusqlite::Connection::open(path).expect("Failed to open second connection");
    conn.execute_batch(&format!(
        "CREATE TRIGGER reject_{event}_{table} BEFORE {event} ON {table}
         BEGIN SELECT RAISE(ABORT, 'writes rejected'); END;"
    ))
    .expect("Failed to install trigger");
}

fn session_count(tracker: &Tracker) -> usize {
    tracker
        .list_all_projects()
        .unwrap()
        .iter()
        .map(|p| tracker.list_sessions_for_project(project_id(p)).unwrap().len())
        .sum()
}

speculate! {
    before {
        let tracker = Tracker::open_memory().expect("Failed to open tracker");
    }

    describe "project lifecycle" {
        describe "create" {
            it "persists the project and assigns an id" {
                let project = tracker.create_project("Alpha", "AI project").expect("Failed to create");

                assert!(project.id.is_some());
                let listed = tracker.list_active_projects().unwrap();
                assert_eq!(listed.len(), 1);
                assert_eq!(listed[0].id, project.id);
                assert_eq!(listed[0].name, "Alpha");
                assert_eq!(listed[0].description, "AI project");
                assert!(!listed[0].archived);
            }

            it "rejects a blank name without writing" {
                let result = tracker.create_project("   ", "");
                assert!(matches!(result, Err(Error::Validation(_))));
                assert!(tracker.list_all_projects().unwrap().is_empty());
            }
        }

        describe "rename" {
            it "is written immediately" {
                let project = tracker.create_project("Alpha", "").unwrap();
                let renamed = tracker.rename_project(project_id(&project), "  Omega ").unwrap();

                assert_eq!(renamed.name, "Omega");
                let stored = tracker.load_project(project_id(&project)).unwrap();
                assert_eq!(stored.name, "Omega");
            }

            it "leaves the project untouched on invalid input" {
                let mut project = tracker.create_project("Alpha", "").unwrap();
                let result = tracker.projects().rename(&mut project, "");

                assert!(matches!(result, Err(Error::Validation(_))));
                assert_eq!(project.name, "Alpha");
                assert_eq!(tracker.load_project(project_id(&project)).unwrap().name, "Alpha");
            }

            it "fails for an unknown project" {
                let result = tracker.rename_project(404, "Omega");
                assert!(matches!(result, Err(Error::NotFound { id: 404, .. })));
            }
        }

        describe "set_description" {
            it "is written immediately" {
                let project = tracker.create_project("Alpha", "old").unwrap();
                tracker.set_description(project_id(&project), "new").unwrap();

                assert_eq!(tracker.load_project(project_id(&project)).unwrap().description, "new");
            }
        }

        describe "archive" {
            it "hides the project from the active listing" {
                let alpha = tracker.create_project("Alpha", "").unwrap();
                tracker.create_project("Beta", "").unwrap();

                let archived = tracker.archive_project(project_id(&alpha)).unwrap();

                assert!(archived.archived);
                let active: Vec<String> = tracker.list_active_projects().unwrap().into_iter().map(|p| p.name).collect();
                assert_eq!(active, vec!["Beta"]);
                assert_eq!(tracker.list_all_projects().unwrap().len(), 2);
            }

            it "is idempotent" {
                let project = tracker.create_project("Alpha", "").unwrap();

                tracker.archive_project(project_id(&project)).expect("First archive failed");
                let again = tracker.archive_project(project_id(&project)).expect("Second archive failed");

                assert!(again.archived);
            }

            it "writes a flag that was only set in memory" {
                let mut project = tracker.create_project("Alpha", "").unwrap();
                project.archive();

                tracker.projects().archive(&mut project).expect("Archive failed");

                assert!(project.archived);
                assert!(tracker.load_project(project_id(&project)).unwrap().archived);
                assert!(tracker.list_active_projects().unwrap().is_empty());
            }

            it "keeps the project's history" {
                let project = tracker.create_project("Alpha", "").unwrap();
                tracker.start_session(project_id(&project), Some("work")).unwrap();
                tracker.stop_session().unwrap();

                tracker.archive_project(project_id(&project)).unwrap();

                let loaded = tracker.load_project(project_id(&project)).unwrap();
                assert!(loaded.archived);
                assert_eq!(loaded.sessions.len(), 1);
            }

            it "is refused while the project has the running session" {
                let project = tracker.create_project("Alpha", "").unwrap();
                let running = tracker.start_session(project_id(&project), Some("work")).unwrap();

                let result = tracker.archive_project(project_id(&project));

                assert!(matches!(result, Err(Error::Conflict(_))));
                let stored = tracker.load_project(project_id(&project)).unwrap();
                assert!(!stored.archived);
                let active = tracker.get_active_session().unwrap().expect("Session should still run");
                assert_eq!(active.session.id, running.id);
            }

            it "is allowed while another project has the running session" {
                let alpha = tracker.create_project("Alpha", "").unwrap();
                let beta = tracker.create_project("Beta", "").unwrap();
                tracker.start_session(project_id(&alpha), None).unwrap();

                let archived = tracker.archive_project(project_id(&beta)).unwrap();
                assert!(archived.archived);
            }
        }
    }

    describe "session lifecycle" {
        describe "start" {
            it "creates a running session" {
                let project = tracker.create_project("Alpha", "").unwrap();
                let session = tracker.start_session(project_id(&project), Some("work")).unwrap();

                assert!(session.id.is_some());
                assert!(session.is_active());
                assert_eq!(session.project_id, project_id(&project));
                assert_eq!(session.description.as_deref(), Some("work"));

                match tracker.sessions().state().unwrap() {
                    SlotState::Running(active) => assert_eq!(active.session, session),
                    SlotState::Idle => panic!("Expected a running session"),
                }
            }

            it "fails while any session runs and writes nothing" {
                let alpha = tracker.create_project("Alpha", "").unwrap();
                let beta = tracker.create_project("Beta", "").unwrap();
                tracker.start_session(project_id(&alpha), Some("work")).unwrap();

                let same = tracker.start_session(project_id(&alpha), None);
                let other = tracker.start_session(project_id(&beta), None);

                assert!(matches!(same, Err(Error::Conflict(_))));
                assert!(matches!(other, Err(Error::Conflict(_))));
                assert_eq!(session_count(&tracker), 1);
            }

            it "fails for an unknown project" {
                let result = tracker.start_session(404, None);
                assert!(matches!(result, Err(Error::NotFound { id: 404, .. })));
            }

            it "fails for an archived project" {
                let project = tracker.create_project("Alpha", "").unwrap();
                tracker.archive_project(project_id(&project)).unwrap();

                let result = tracker.start_session(project_id(&project), None);
                assert!(matches!(result, Err(Error::Conflict(_))));
                assert_eq!(session_count(&tracker), 0);
            }
        }

        describe "stop" {
            it "ends the running session" {
                let project = tracker.create_project("Alpha", "").unwrap();
                let started = tracker.start_session(project_id(&project), None).unwrap();

                let stopped = tracker.stop_session().unwrap();

                assert_eq!(stopped.id, started.id);
                assert!(!stopped.is_active());
                assert!(stopped.end_time.unwrap() >= stopped.start_time);
                assert!(!stopped.elapsed().active);
                assert!(tracker.get_active_session().unwrap().is_none());
                assert_eq!(tracker.sessions().state().unwrap(), SlotState::Idle);
            }

            it "fails when nothing runs and writes nothing" {
                let project = tracker.create_project("Alpha", "").unwrap();
                tracker.start_session(project_id(&project), None).unwrap();
                let ended = tracker.stop_session().unwrap();

                let result = tracker.stop_session();

                assert!(matches!(result, Err(Error::NoActiveSession)));
                let stored = tracker.list_sessions_for_project(project_id(&project)).unwrap();
                assert_eq!(stored, vec![ended]);
            }
        }

        describe "in-memory projects" {
            it "keeps the loaded collection in sync" {
                let created = tracker.create_project("Alpha", "").unwrap();
                let mut project = tracker.load_project(project_id(&created)).unwrap();

                tracker.sessions().start_in(&mut project, Some("work")).unwrap();
                assert_eq!(project.sessions.len(), 1);
                assert!(project.active_session().is_some());

                tracker.sessions().stop_in(&mut project).unwrap();
                assert_eq!(project.sessions.len(), 1);
                assert!(project.active_session().is_none());

                let reloaded = tracker.load_project(project_id(&created)).unwrap();
                assert_eq!(reloaded.sessions, project.sessions);
            }

            it "does not touch a project the stopped session does not belong to" {
                let alpha = tracker.create_project("Alpha", "").unwrap();
                let beta = tracker.create_project("Beta", "").unwrap();
                tracker.start_session(project_id(&alpha), None).unwrap();

                let mut beta = tracker.load_project(project_id(&beta)).unwrap();
                let stopped = tracker.sessions().stop_in(&mut beta).unwrap();

                assert_eq!(stopped.project_id, project_id(&alpha));
                assert!(beta.sessions.is_empty());
            }
        }

        describe "list_sessions_for_project" {
            it "fails for an unknown project" {
                let result = tracker.list_sessions_for_project(404);
                assert!(matches!(result, Err(Error::NotFound { .. })));
            }
        }

        describe "corrupted store" {
            it "surfaces duplicate running sessions instead of picking one" {
                let alpha = tracker.create_project("Alpha", "").unwrap();
                let beta = tracker.create_project("Beta", "").unwrap();
                let db = tracker.database();
                db.save_new_session(&mut WorkSession::start(project_id(&alpha), None)).unwrap();
                db.save_new_session(&mut WorkSession::start(project_id(&beta), None)).unwrap();

                assert!(matches!(tracker.get_active_session(), Err(Error::DataIntegrity(_))));
                assert!(matches!(tracker.stop_session(), Err(Error::DataIntegrity(_))));
                assert!(matches!(tracker.start_session(project_id(&alpha), None), Err(Error::DataIntegrity(_))));
                assert_eq!(session_count(&tracker), 2);
            }
        }
    }

    describe "scenario" {
        it "allows one running session across projects" {
            let alpha = tracker.create_project("Alpha", "").unwrap();
            let beta = tracker.create_project("Beta", "").unwrap();

            tracker.start_session(project_id(&alpha), Some("work")).unwrap();

            let conflict = tracker.start_session(project_id(&beta), None);
            assert!(matches!(conflict, Err(Error::Conflict(_))));
            let active = tracker.get_active_session().unwrap().unwrap();
            assert_eq!(active.project_name, "Alpha");
            assert_eq!(active.session.project_id, project_id(&alpha));

            tracker.stop_session().unwrap();
            assert!(tracker.get_active_session().unwrap().is_none());

            let session = tracker.start_session(project_id(&beta), None).unwrap();
            assert_eq!(session.project_id, project_id(&beta));
            let active = tracker.get_active_session().unwrap().unwrap();
            assert_eq!(active.project_name, "Beta");
        }
    }
}

#[test]
fn state_survives_reopening_the_store() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tracker.db");

    let project_id = {
        let tracker = Tracker::open(&path).unwrap();
        let project = tracker.create_project("Alpha", "").unwrap();
        tracker.start_session(project.id.unwrap(), Some("work")).unwrap();
        project.id.unwrap()
    };

    let tracker = Tracker::open(&path).unwrap();
    let active = tracker.get_active_session().unwrap().expect("Session should still run");
    assert_eq!(active.session.project_id, project_id);
    assert!(matches!(tracker.start_session(project_id, None), Err(Error::Conflict(_))));
}

#[test]
fn failed_project_writes_leave_entity_and_row_unchanged() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tracker.db");
    let tracker = Tracker::open(&path).unwrap();
    let created = tracker.create_project("Alpha", "old notes").unwrap();
    let id = project_id(&created);

    reject_writes(&path, "UPDATE", "projects");
    let mut project = tracker.load_project(id).unwrap();

    let renamed = tracker.projects().rename(&mut project, "Omega");
    assert!(matches!(renamed, Err(Error::Persistence(_))));
    assert_eq!(project.name, "Alpha");

    let described = tracker.projects().set_description(&mut project, "new notes");
    assert!(matches!(described, Err(Error::Persistence(_))));
    assert_eq!(project.description, "old notes");

    let archived = tracker.projects().archive(&mut project);
    assert!(matches!(archived, Err(Error::Persistence(_))));
    assert!(!project.archived);

    let stored = tracker.load_project(id).unwrap();
    assert_eq!(stored, project);
    assert_eq!(tracker.list_active_projects().unwrap().len(), 1);
}

#[test]
fn failed_stop_keeps_the_session_running() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tracker.db");
    let tracker = Tracker::open(&path).unwrap();
    let project = tracker.create_project("Alpha", "").unwrap();
    let started = tracker.start_session(project_id(&project), None).unwrap();

    reject_writes(&path, "UPDATE", "work_sessions");

    assert!(matches!(tracker.stop_session(), Err(Error::Persistence(_))));
    let active = tracker.get_active_session().unwrap().expect("Session should still run");
    assert_eq!(active.session, started);
}

#[test]
fn orphaned_running_session_blocks_start() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tracker.db");
    let alpha = {
        let tracker = Tracker::open(&path).unwrap();
        project_id(&tracker.create_project("Alpha", "").unwrap())
    };

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.pragma_update(None, "foreign_keys", "OFF").unwrap();
    conn.execute(
        "INSERT INTO work_sessions (project_id, start_time, end_time, description)
         VALUES (99, '2025-03-14T09:00:00', NULL, NULL)",
        [],
    )
    .unwrap();
    drop(conn);

    let tracker = Tracker::open(&path).unwrap();

    assert!(matches!(tracker.get_active_session(), Err(Error::DataIntegrity(_))));
    assert!(matches!(tracker.start_session(alpha, None), Err(Error::DataIntegrity(_))));
    assert!(tracker.list_sessions_for_project(alpha).unwrap().is_empty());
}

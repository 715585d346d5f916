//! Unit tests for the manager.

use std::fs;
use std::sync::Arc;
use std::thread;

use camino::Utf8PathBuf;
use gsnip_protocol::{Opcode, Request};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::{Manager, ManagerError};
use crate::backing_file::BackingFile;
use crate::snippet::Snippet;

const TWO_SNIPPETS: &str = "\
startsnip beta \"second letter\"
b
endsnip

startsnip alpha \"first letter\"
a
endsnip
";

struct Workspace {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl Workspace {
    fn with_content(content: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("snippets"))
            .expect("temp path is UTF-8");
        fs::write(&path, content).expect("seed snippet file");
        Self { _dir: dir, path }
    }

    fn manager(&self) -> Manager {
        let file = BackingFile::open(self.path.clone()).expect("open backing file");
        Manager::open(file).expect("open manager")
    }

    fn on_disk(&self) -> String {
        fs::read_to_string(&self.path).expect("read snippet file")
    }
}

#[fixture]
fn empty() -> Workspace {
    Workspace::with_content("")
}

#[fixture]
fn letters() -> Workspace {
    Workspace::with_content(TWO_SNIPPETS)
}

fn request(operation: Opcode, body: &str) -> Request {
    Request::new(operation, body)
}

fn insert_text(name: &str, description: &str, body: &str) -> String {
    Snippet::new(name, description, body).repr()
}

#[rstest]
fn empty_file_opens_as_empty_container(empty: Workspace) {
    let manager = empty.manager();
    assert!(manager.list_all().expect("list all").is_empty());
    let reply = manager.execute(&request(Opcode::List, ""));
    assert!(reply.is_success());
    assert!(reply.body().is_empty());
}

#[rstest]
fn list_reply_is_sorted_and_newline_terminated(letters: Workspace) {
    let reply = letters.manager().execute(&request(Opcode::List, ""));
    assert!(reply.is_success());
    assert_eq!(reply.body(), b"alpha\tfirst letter\nbeta\tsecond letter\n");
}

#[rstest]
#[case("alpha", b"a".as_slice())]
#[case("  beta \n", b"b".as_slice())]
fn find_returns_the_snippet_body(letters: Workspace, #[case] name: &str, #[case] body: &[u8]) {
    let reply = letters.manager().execute(&request(Opcode::Find, name));
    assert!(reply.is_success());
    assert_eq!(reply.body(), body);
}

#[rstest]
fn find_of_missing_name_fails_without_mutation(letters: Workspace) {
    let manager = letters.manager();
    let before = letters.on_disk();
    let reply = manager.execute(&request(Opcode::Find, "missing"));
    assert!(!reply.is_success());
    assert_eq!(reply.encode(), b"ERROR");
    assert_eq!(letters.on_disk(), before);
    assert_eq!(manager.list_all().expect("list all").len(), 2);
}

#[rstest]
fn second_insert_of_a_name_fails(empty: Workspace) {
    let manager = empty.manager();
    let first = manager.execute(&request(Opcode::Insert, &insert_text("func", "desc", "one")));
    assert!(first.is_success());
    let second = manager.execute(&request(Opcode::Insert, &insert_text("func", "other", "two")));
    assert!(!second.is_success());

    let stored = manager.list_all().expect("list all");
    assert_eq!(stored, vec![Snippet::new("func", "desc", "one")]);
    assert_eq!(empty.on_disk().matches("startsnip func").count(), 1);
}

#[rstest]
fn insert_rewrites_file_sorted_and_reloads(letters: Workspace) {
    let manager = letters.manager();
    let reply = manager.execute(&request(
        Opcode::Insert,
        &insert_text("aardvark", "early", "first\nsecond"),
    ));
    assert!(reply.is_success());

    let expected = [
        Snippet::new("aardvark", "early", "first\nsecond"),
        Snippet::new("alpha", "first letter", "a"),
        Snippet::new("beta", "second letter", "b"),
    ];
    let disk: String = expected.iter().map(Snippet::repr).collect();
    assert_eq!(letters.on_disk(), disk);
    assert_eq!(manager.list_all().expect("list all"), expected);
}

#[rstest]
fn batch_with_a_duplicate_changes_nothing(letters: Workspace) {
    let manager = letters.manager();
    let before = letters.on_disk();
    let batch = format!(
        "{}{}",
        insert_text("gamma", "new", "g"),
        insert_text("alpha", "clash", "x")
    );
    let reply = manager.execute(&request(Opcode::Insert, &batch));
    assert!(!reply.is_success());
    assert_eq!(letters.on_disk(), before);
    let names: Vec<String> = manager
        .list_all()
        .expect("list all")
        .into_iter()
        .map(|snippet| snippet.name)
        .collect();
    assert_eq!(names, ["alpha", "beta"]);
}

#[rstest]
#[case::no_blocks("just words")]
#[case::blank("   ")]
fn insert_without_blocks_fails(empty: Workspace, #[case] body: &str) {
    let manager = empty.manager();
    assert!(matches!(
        manager.run(&request(Opcode::Insert, body)),
        Err(ManagerError::EmptyInsert)
    ));
}

#[rstest]
fn insert_with_malformed_block_fails(empty: Workspace) {
    let manager = empty.manager();
    let reply = manager.execute(&request(Opcode::Insert, "startsnip broken\nx\nendsnip\n"));
    assert!(!reply.is_success());
    assert!(manager.list_all().expect("list all").is_empty());
}

#[rstest]
fn delete_removes_and_is_idempotent(letters: Workspace) {
    let manager = letters.manager();
    assert!(manager.execute(&request(Opcode::Delete, "beta")).is_success());
    assert!(manager.execute(&request(Opcode::Delete, "beta")).is_success());
    assert!(manager.execute(&request(Opcode::Delete, "never")).is_success());
    assert_eq!(
        manager.list_all().expect("list all"),
        vec![Snippet::new("alpha", "first letter", "a")]
    );
    assert!(!letters.on_disk().contains("beta"));
}

#[rstest]
fn reload_picks_up_external_edits(letters: Workspace) {
    let manager = letters.manager();
    fs::write(&letters.path, insert_text("zulu", "edited", "z")).expect("external edit");
    assert!(manager.execute(&request(Opcode::Reload, "")).is_success());
    assert_eq!(
        manager.list_all().expect("list all"),
        vec![Snippet::new("zulu", "edited", "z")]
    );
}

#[rstest]
fn reload_of_emptied_file_gives_empty_container(letters: Workspace) {
    let manager = letters.manager();
    fs::write(&letters.path, "").expect("empty file");
    manager.reload().expect("reload");
    assert!(manager.snapshot().expect("snapshot").is_empty().expect("is empty"));
}

#[rstest]
fn failed_reload_keeps_serving_previous_container(letters: Workspace) {
    let manager = letters.manager();
    fs::write(&letters.path, "startsnip noquotes\nbody\nendsnip\n").expect("corrupt file");
    assert!(matches!(manager.reload(), Err(ManagerError::Parse(_))));
    assert_eq!(manager.list_all().expect("list all").len(), 2);
}

#[rstest]
fn snapshot_taken_before_a_mutation_is_unchanged(letters: Workspace) {
    let manager = letters.manager();
    let before = manager.snapshot().expect("snapshot");
    assert!(manager.execute(&request(Opcode::Delete, "alpha")).is_success());
    assert_eq!(before.len().expect("len"), 2);
    assert_eq!(manager.snapshot().expect("snapshot").len().expect("len"), 1);
}

#[rstest]
fn listing_after_mutation_matches_staged_contents(empty: Workspace) {
    let manager = empty.manager();
    for name in ["delta", "bravo", "charlie"] {
        let reply = manager.execute(&request(Opcode::Insert, &insert_text(name, name, name)));
        assert!(reply.is_success());
    }
    let names: Vec<String> = manager
        .list_all()
        .expect("list all")
        .into_iter()
        .map(|snippet| snippet.name)
        .collect();
    assert_eq!(names, ["bravo", "charlie", "delta"]);

    let reopened = empty.manager();
    assert_eq!(
        reopened.list_all().expect("list all"),
        manager.list_all().expect("list all")
    );
}

#[rstest]
#[case("startsnip noquotes\nbody\nendsnip")]
#[case("startsnip twin \"a\"\n1\nendsnip\nstartsnip twin \"b\"\n2\nendsnip\n")]
#[case("startsnip open \"never closed\"\nbody\n")]
fn malformed_file_fails_construction(#[case] content: &str) {
    let workspace = Workspace::with_content(content);
    let file = BackingFile::open(workspace.path.clone()).expect("open backing file");
    assert!(Manager::open(file).is_err());
}

#[rstest]
fn undefined_requests_are_unsupported(empty: Workspace) {
    let manager = empty.manager();
    assert!(matches!(
        manager.run(&request(Opcode::Undefined, "")),
        Err(ManagerError::Unsupported {
            opcode: Opcode::Undefined
        })
    ));
}

#[rstest]
fn non_utf8_bodies_are_rejected(letters: Workspace) {
    let manager = letters.manager();
    let reply = manager.execute(&Request::new(Opcode::Find, vec![0xff, 0xfe]));
    assert!(!reply.is_success());
}

#[rstest]
fn concurrent_inserts_of_one_name_admit_a_single_winner(empty: Workspace) {
    let manager = Arc::new(empty.manager());
    let handles: Vec<_> = (0..6)
        .map(|attempt| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let text = insert_text("shared", &format!("attempt {attempt}"), "x");
                manager.execute(&Request::new(Opcode::Insert, text)).is_success()
            })
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|handle| handle.join().expect("join insert thread"))
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(manager.list_all().expect("list all").len(), 1);
    assert_eq!(empty.on_disk().matches("startsnip shared").count(), 1);
}

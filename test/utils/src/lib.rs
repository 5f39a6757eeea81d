use std::env;
use std::fs;
use std::path;

use tempfile::TempDir;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

/// Creates a temporary directory holding the given `(relative path, content)`
/// pairs. The directory is removed once the returned handle is dropped.
pub fn fixture_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, content) in files {
        write_fixture(dir.path(), rel, content);
    }

    return dir;
}

pub fn write_fixture(root: &path::Path, rel: &str, content: &str) -> path::PathBuf {
    let file_path = root.join(rel);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();

    return file_path;
}

/// Response body of a streamed Claude completion, one SSE event per fragment.
pub fn claude_sse_fixture(fragments: &[&str]) -> String {
    let mut events = vec![
        "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"role\":\"assistant\",\"content\":[]}}".to_string(),
        "event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}".to_string(),
        "event: ping\ndata: {\"type\":\"ping\"}".to_string(),
    ];

    for fragment in fragments {
        let delta = format!(
            "{{\"type\":\"content_block_delta\",\"index\":0,\"delta\":{{\"type\":\"text_delta\",\"text\":{}}}}}",
            json_string(fragment)
        );
        events.push(format!("event: content_block_delta\ndata: {delta}"));
    }

    events.push("event: content_block_stop\ndata: {\"type\":\"content_block_stop\",\"index\":0}".to_string());
    events.push("event: message_delta\ndata: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"}}".to_string());
    events.push("event: message_stop\ndata: {\"type\":\"message_stop\"}".to_string());

    return events.join("\n\n") + "\n\n";
}

/// Response body of a streamed OpenAI chat completion.
pub fn openai_sse_fixture(fragments: &[&str]) -> String {
    let mut events =
        vec!["data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}".to_string()];

    for fragment in fragments {
        events.push(format!(
            "data: {{\"id\":\"c1\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":{}}}}}]}}",
            json_string(fragment)
        ));
    }

    events.push("data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}".to_string());
    events.push("data: [DONE]".to_string());

    return events.join("\n\n") + "\n\n";
}

fn json_string(text: &str) -> String {
    return serde_json::to_string(text).unwrap();
}

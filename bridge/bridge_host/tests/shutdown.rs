use serde_json::{Value, json};
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;

const CLONES: u64 = 200;

fn frame(value: &Value) -> Vec<u8> {
    let payload = serde_json::to_vec(value).expect("encode frame");
    let len = u32::try_from(payload.len()).expect("frame fits u32");
    let mut out = len.to_be_bytes().to_vec();
    out.extend(payload);
    out
}

fn read_frames(mut data: &[u8]) -> Vec<Value> {
    let mut frames = Vec::new();
    while !data.is_empty() {
        let mut len = [0_u8; 4];
        data.read_exact(&mut len).expect("length prefix");
        let mut payload = vec![0_u8; u32::from_be_bytes(len) as usize];
        data.read_exact(&mut payload).expect("payload");
        frames.push(serde_json::from_slice(&payload).expect("frame json"));
    }
    frames
}

#[test]
fn queued_replies_are_written_before_exit() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bridge_host"))
        .env("BEAGLE_BRIDGE_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn bridge_host");

    let mut stdin = child.stdin.take().expect("stdin");
    let feeder = thread::spawn(move || {
        let start = json!({ "t": "start", "id": 0, "params": { "baseUrl": "https://example.com" } });
        stdin.write_all(&frame(&start)).expect("write start");

        for id in 1..=CLONES {
            let clone = json!({
                "t": "render.cloneTemplate",
                "id": id,
                "template": { "_beagleComponent_": "beagle:text", "id": format!("t{id}") }
            });
            stdin.write_all(&frame(&clone)).expect("write clone");
        }
        // dropping stdin closes it
    });

    let output = child.wait_with_output().expect("bridge_host output");
    feeder.join().expect("feeder thread");
    assert!(output.status.success());

    let frames = read_frames(&output.stdout);
    assert_eq!(frames.len() as u64, CLONES + 2);
    assert_eq!(frames[0]["t"], "ready");

    let results: Vec<_> = frames[1..]
        .iter()
        .map(|frame| {
            assert_eq!(frame["t"], "result", "unexpected frame {frame}");
            frame["id"].as_u64().expect("result id")
        })
        .collect();
    assert_eq!(results, (0..=CLONES).collect::<Vec<_>>());
}

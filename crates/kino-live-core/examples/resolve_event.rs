//! Playback resolution example
//!
//! Shows how raw event payloads resolve to a playback source.
//!
//! Run with: cargo run -p kino-live-core --example resolve_event

use kino_live_core::EventView;
use serde_json::json;

fn main() {
    println!("Kino Live Core - Playback Resolution Example");
    println!("============================================\n");

    let events = [
        (
            "Finished event with recording",
            json!({
                "eventId": "evt-100",
                "title": "Product Launch",
                "eventType": "vod",
                "cloudFrontUrl": "https://a",
                "vodStatus": "READY",
                "vodCloudFrontUrl": "https://b"
            }),
        ),
        (
            "Live event on MediaPackage only",
            json!({ "eventId": "evt-101", "mediaPackageUrl": "https://m" }),
        ),
        ("Scheduled event, nothing to play", json!({ "eventId": "evt-102", "eventType": "scheduled" })),
    ];

    for (label, raw) in events {
        let view = EventView::from_raw(&raw);
        println!("{}:", label);
        match view.playback() {
            Some(source) => println!("  {} -> {}", source.mode, source.url),
            None => println!("  cannot play"),
        }
        println!();
    }
}

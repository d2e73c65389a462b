//! On-disk raw record fixtures.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use sparkify_core::PipelineConfig;
use tempfile::TempDir;

pub const SETANTA_SONG_ID: &str = "SOZCTXZ12AB0182364";
pub const ELENA_ARTIST_ID: &str = "AR5KOSW1187FB35FF4";

/// `2018-11-09 00:02:27.796 UTC`
pub const TS_NOV_9: i64 = 1_541_721_747_796;
/// `2018-11-21 21:56:47.796 UTC`
pub const TS_NOV_21: i64 = 1_542_837_407_796;

/// Input and output roots under a temporary directory.
pub struct Lake {
    dir: TempDir,
}

impl Lake {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("input")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.storage.input_data = self.input().display().to_string();
        config.storage.output_data = self.output().display().to_string();
        config
    }

    /// Write one catalog record per file, nested like the source bucket.
    pub fn add_songs(&self, songs: &[Value]) {
        for (i, song) in songs.iter().enumerate() {
            let dir = self.input().join("song_data/A/B/C");
            write_lines(&dir, &format!("TRABC{i:04}.json"), std::slice::from_ref(song));
        }
    }

    /// Write all events to one daily log file.
    pub fn add_events(&self, day: &str, events: &[Value]) {
        let dir = self.input().join("log_data/2018/11");
        write_lines(&dir, &format!("{day}-events.json"), events);
    }

    pub fn output_dir(&self, table: &str) -> PathBuf {
        self.output().join(table)
    }
}

fn write_lines(dir: &Path, name: &str, records: &[Value]) {
    fs::create_dir_all(dir).unwrap();
    let body: Vec<String> = records.iter().map(Value::to_string).collect();
    fs::write(dir.join(name), body.join("\n")).unwrap();
}

pub fn song(song_id: &str, title: &str, artist_id: &str, artist_name: &str, year: i64) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": 269.58322,
        "year": year
    })
}

pub fn setanta_matins() -> Value {
    song(SETANTA_SONG_ID, "Setanta matins", ELENA_ARTIST_ID, "Elena", 0)
}

pub fn event(
    page: &str,
    song: Option<&str>,
    artist: Option<&str>,
    ts: i64,
    user_id: &str,
) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Lily",
        "gender": "F",
        "itemInSession": 5,
        "lastName": "Koch",
        "length": 269.58322,
        "level": "paid",
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "method": "PUT",
        "page": page,
        "registration": 1_541_048_010_796.0,
        "sessionId": 818,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (X11; Linux x86_64)",
        "userId": user_id
    })
}

pub fn play(song: &str, artist: &str, ts: i64, user_id: &str) -> Value {
    event("NextSong", Some(song), Some(artist), ts, user_id)
}

pub fn with_level(mut record: Value, level: &str) -> Value {
    record["level"] = json!(level);
    record
}

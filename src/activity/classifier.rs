//! Session classification
//!
//! Pure aggregation over the raw session list. No I/O, no clock: the same
//! input always produces the same `Aggregate`, which is what the tests rely
//! on.

use super::client::RawSession;

const TRANSCODE: &str = "transcode";
const DIRECT_PLAY: &str = "direct play";

/// Aggregate counts derived from one poll's session list
///
/// Recomputed whole on every successful poll; never updated incrementally.
/// `direct + transcode == total` holds for every value this module produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub total: u64,
    pub direct: u64,
    pub transcode: u64,
    pub video_transcodes: u64,
    pub audio_transcodes: u64,
    pub container_transcodes: u64,
}

/// Classify a session list into aggregate counts
///
/// A session counts as a transcode stream when any of the video, audio, or
/// container decisions is "transcode"; missing decisions default to
/// "direct play".
pub fn classify(sessions: &[RawSession]) -> Aggregate {
    let mut agg = Aggregate {
        total: sessions.len() as u64,
        ..Aggregate::default()
    };

    for session in sessions {
        let video = decision(&session.transcode_video_decision);
        let audio = decision(&session.transcode_audio_decision);
        let container = decision(&session.transcode_container_decision);

        if video == TRANSCODE {
            agg.video_transcodes += 1;
        }
        if audio == TRANSCODE {
            agg.audio_transcodes += 1;
        }
        if container == TRANSCODE {
            agg.container_transcodes += 1;
        }

        if [video, audio, container].contains(&TRANSCODE) {
            agg.transcode += 1;
        } else {
            agg.direct += 1;
        }
    }

    agg
}

fn decision(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or(DIRECT_PLAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(video: Option<&str>, audio: Option<&str>, container: Option<&str>) -> RawSession {
        RawSession {
            transcode_video_decision: video.map(str::to_string),
            transcode_audio_decision: audio.map(str::to_string),
            transcode_container_decision: container.map(str::to_string),
        }
    }

    #[test]
    fn empty_list_is_all_zeros() {
        assert_eq!(classify(&[]), Aggregate::default());
    }

    #[test]
    fn one_video_transcode_one_direct() {
        let sessions = vec![
            session(Some("transcode"), Some("direct play"), Some("direct play")),
            session(Some("direct play"), Some("direct play"), Some("direct play")),
        ];

        let agg = classify(&sessions);
        assert_eq!(
            agg,
            Aggregate {
                total: 2,
                direct: 1,
                transcode: 1,
                video_transcodes: 1,
                audio_transcodes: 0,
                container_transcodes: 0,
            }
        );
    }

    #[test]
    fn missing_decisions_default_to_direct() {
        let agg = classify(&[session(None, None, None)]);
        assert_eq!(agg.total, 1);
        assert_eq!(agg.direct, 1);
        assert_eq!(agg.transcode, 0);
    }

    #[test]
    fn multi_dimension_transcode_counts_stream_once() {
        let agg = classify(&[session(
            Some("transcode"),
            Some("transcode"),
            Some("transcode"),
        )]);
        assert_eq!(agg.total, 1);
        assert_eq!(agg.transcode, 1);
        assert_eq!(agg.direct, 0);
        assert_eq!(agg.video_transcodes, 1);
        assert_eq!(agg.audio_transcodes, 1);
        assert_eq!(agg.container_transcodes, 1);
    }

    #[test]
    fn copy_dimension_alone_is_not_a_transcode() {
        // Tautulli also reports "copy" for remuxed dimensions; only the
        // literal "transcode" decision counts.
        let agg = classify(&[session(Some("copy"), Some("copy"), Some("direct play"))]);
        assert_eq!(agg.direct, 1);
        assert_eq!(agg.transcode, 0);
        assert_eq!(agg.video_transcodes, 0);
    }

    #[test]
    fn direct_plus_transcode_always_equals_total() {
        let decisions = [None, Some("direct play"), Some("transcode"), Some("copy")];
        let mut sessions = Vec::new();
        for v in &decisions {
            for a in &decisions {
                for c in &decisions {
                    sessions.push(session(*v, *a, *c));
                }
            }
        }

        let agg = classify(&sessions);
        assert_eq!(agg.total, sessions.len() as u64);
        assert_eq!(agg.direct + agg.transcode, agg.total);
    }
}

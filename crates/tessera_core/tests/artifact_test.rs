use base64::Engine as _;
use std::path::Path;
use tessera_core::{Artifact, ArtifactKind, AudioPayload, MediaSource, RawResponse, Role};

#[test]
fn audio_takes_priority_over_image_and_text() {
    let raw = RawResponse {
        content: Some("transcript".to_string()),
        image_refs: vec!["https://example.com/a.png".to_string()],
        audio: Some(AudioPayload {
            data: base64::engine::general_purpose::STANDARD.encode(b"RIFF"),
            format: Some("mp3".to_string()),
        }),
    };

    let artifact = Artifact::from_raw(&raw, "txt").expect("artifact");

    assert_eq!(artifact.kind(), ArtifactKind::Audio);
    assert_eq!(artifact.extension(), "mp3");
}

#[test]
fn image_takes_priority_over_text() {
    let raw = RawResponse {
        content: Some("here is your image".to_string()),
        image_refs: vec!["https://example.com/wall.JPG?size=large".to_string()],
        audio: None,
    };

    let artifact = Artifact::from_raw(&raw, "txt").expect("artifact");

    assert_eq!(artifact.kind(), ArtifactKind::Image);
    assert_eq!(artifact.extension(), "jpg");
    assert_eq!(artifact.column_value(None), "https://example.com/wall.JPG?size=large");
    assert!(artifact.content().is_none());
}

#[test]
fn data_uri_images_are_decoded() {
    let encoded = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
    let raw = RawResponse {
        image_refs: vec![format!("data:image/webp;base64,{}", encoded)],
        ..Default::default()
    };

    let artifact = Artifact::from_raw(&raw, "txt").expect("artifact");

    match &artifact {
        Artifact::Image { source, mime, extension } => {
            assert_eq!(source, &MediaSource::Base64(encoded.clone()));
            assert_eq!(mime, "image/webp");
            assert_eq!(extension, "webp");
        }
        other => panic!("expected image, got {:?}", other),
    }
    assert_eq!(
        artifact.content().expect("content").as_bytes(),
        &[1u8, 2, 3]
    );
}

#[test]
fn text_uses_requested_extension() {
    let artifact = Artifact::from_raw(&RawResponse::text("hello"), "md").expect("artifact");
    assert_eq!(artifact.kind(), ArtifactKind::Text);
    assert_eq!(artifact.extension(), "md");
    assert_eq!(artifact.column_value(None), "hello");
    assert_eq!(
        artifact.column_value(Some(Path::new("out/a.md"))),
        "out/a.md"
    );
}

#[test]
fn empty_response_is_rejected() {
    assert!(Artifact::from_raw(&RawResponse::text("   "), "txt").is_err());
    assert!(Artifact::from_raw(&RawResponse::default(), "txt").is_err());
}

#[test]
fn media_attempts_replay_as_placeholder_and_user_turn() {
    let artifact = Artifact::Image {
        source: MediaSource::Url("https://example.com/a.png".to_string()),
        mime: "image/png".to_string(),
        extension: "png".to_string(),
    };

    let turns = artifact.attempt_turns();

    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::Assistant);
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(turns[1].content.len(), 2);
}

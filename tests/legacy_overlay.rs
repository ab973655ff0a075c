//! Legacy overlay routing tests.

mod common;

use subpix::{
    DecodeOutcome, DisplayArea, LegacyOverlayBridge, Palette, RawRect, RectContent, TrackOptions,
    ValidityWindow,
};

use common::{GREEN, OverlayRecorder, Recorded, frame, packet, palette_rect, scripted_track};

#[test]
fn rgba_disabled_pushes_to_overlay() {
    let overlay = OverlayRecorder::new();
    let frames = vec![Some(frame(vec![palette_rect(100, 100, 50, 50)], 0, 2000))];
    let (mut track, _) = scripted_track(
        'b',
        frames,
        (720, 576),
        TrackOptions::new().with_rgba_support(false),
        overlay.handle.clone(),
    );

    assert_eq!(track.decode(&packet(10.0)), DecodeOutcome::Legacy);
    assert_eq!(track.bitmap_count(), 0);
    assert!(track.bitmaps(&DisplayArea::new(1280, 720), 11.8).parts.is_empty());

    assert_eq!(*overlay.created.borrow(), vec![(720, 576)]);
    assert_eq!(
        overlay.events(),
        vec![Recorded::Show {
            x: 100,
            y: 100,
            width: 50,
            height: 50,
            first_color: GREEN,
            window: ValidityWindow::new(Some(10.0), Some(12.0)),
        }]
    );
    assert!(overlay.handle.take_redraw_request());
    assert!(!overlay.handle.take_redraw_request());
}

#[test]
fn rgba_enabled_broadcast_skips_overlay() {
    let overlay = OverlayRecorder::new();
    let frames = vec![Some(frame(vec![palette_rect(0, 0, 4, 4)], 0, 0))];
    let (mut track, _) = scripted_track(
        'b',
        frames,
        (0, 0),
        TrackOptions::new(),
        overlay.handle.clone(),
    );

    assert_eq!(track.decode(&packet(1.0)), DecodeOutcome::Rgba { parts: 1 });
    assert_eq!(track.bitmaps(&DisplayArea::new(720, 576), 1.0).parts.len(), 1);
    assert!(!overlay.handle.is_created());
    assert!(!overlay.handle.take_redraw_request());
}

#[test]
fn dvd_and_xsub_always_use_overlay() {
    for tag in ['v', 'x'] {
        let overlay = OverlayRecorder::new();
        let frames = vec![Some(frame(vec![palette_rect(0, 0, 4, 4)], 0, 0))];
        let (mut track, _) = scripted_track(
            tag,
            frames,
            (720, 480),
            TrackOptions::new(),
            overlay.handle.clone(),
        );

        assert_eq!(track.decode(&packet(1.0)), DecodeOutcome::Legacy, "tag {tag}");
        assert_eq!(track.bitmap_count(), 0);
        assert_eq!(overlay.events().len(), 1);
    }
}

#[test]
fn empty_frame_clears_existing_overlay() {
    let overlay = OverlayRecorder::new();
    let frames = vec![
        Some(frame(vec![palette_rect(0, 0, 4, 4)], 0, 0)),
        Some(frame(Vec::new(), 0, 0)),
    ];
    let (mut track, _) = scripted_track(
        'v',
        frames,
        (720, 576),
        TrackOptions::new(),
        overlay.handle.clone(),
    );

    track.decode(&packet(1.0));
    overlay.handle.take_redraw_request();
    assert_eq!(track.decode(&packet(5.0)), DecodeOutcome::Empty);

    let events = overlay.events();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        Recorded::Clear {
            window: ValidityWindow::new(Some(5.0), None),
        }
    );
    assert!(overlay.handle.take_redraw_request());
}

#[test]
fn empty_frame_without_overlay_creates_nothing() {
    let overlay = OverlayRecorder::new();
    let frames = vec![Some(frame(Vec::new(), 0, 0))];
    let (mut track, _) = scripted_track(
        'v',
        frames,
        (720, 576),
        TrackOptions::new(),
        overlay.handle.clone(),
    );

    assert_eq!(track.decode(&packet(1.0)), DecodeOutcome::Empty);
    assert!(!overlay.handle.is_created());
    assert!(overlay.events().is_empty());
    assert!(!overlay.handle.take_redraw_request());
}

#[test]
fn overlay_is_created_once_across_tracks() {
    let overlay = OverlayRecorder::new();
    let (mut first, _) = scripted_track(
        'v',
        vec![Some(frame(vec![palette_rect(0, 0, 2, 2)], 0, 0))],
        (720, 576),
        TrackOptions::new(),
        overlay.handle.clone(),
    );
    let (mut second, _) = scripted_track(
        'x',
        vec![Some(frame(vec![palette_rect(0, 0, 2, 2)], 0, 0))],
        (640, 480),
        TrackOptions::new(),
        overlay.handle.clone(),
    );

    first.decode(&packet(1.0));
    second.decode(&packet(2.0));
    assert_eq!(*overlay.created.borrow(), vec![(720, 576)]);
    assert_eq!(overlay.events().len(), 2);
}

#[test]
fn only_the_first_rect_is_pushed() {
    let overlay = OverlayRecorder::new();
    let bridge = LegacyOverlayBridge::new(overlay.handle.clone());
    let rects = vec![palette_rect(1, 2, 3, 3), palette_rect(40, 50, 3, 3)];

    bridge
        .push(&rects, (720, 576), ValidityWindow::UNSET)
        .expect("Palette rect should push");

    let events = overlay.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Recorded::Show { x: 1, y: 2, .. }));
}

#[test]
fn malformed_rect_is_not_pushed() {
    let overlay = OverlayRecorder::new();
    let bridge = LegacyOverlayBridge::new(overlay.handle.clone());
    let rect = RawRect {
        x: 0,
        y: 0,
        width: 10,
        height: 10,
        content: RectContent::PaletteBitmap {
            indices: vec![0; 20],
            stride: 10,
            palette: Palette::new(),
        },
    };

    let result = bridge.push(&[rect], (720, 576), ValidityWindow::UNSET);
    assert!(result.is_err());
    assert!(!overlay.handle.is_created());
    assert!(overlay.events().is_empty());
}

#[test]
fn push_clear_reports_whether_overlay_exists() {
    let overlay = OverlayRecorder::new();
    let bridge = LegacyOverlayBridge::new(overlay.handle.clone());
    assert!(!bridge.push_clear(ValidityWindow::UNSET));

    bridge
        .push(&[palette_rect(0, 0, 1, 1)], (0, 0), ValidityWindow::UNSET)
        .expect("Palette rect should push");
    assert!(bridge.push_clear(ValidityWindow::UNSET));
    assert_eq!(overlay.events().len(), 2);
}

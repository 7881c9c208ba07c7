//! Looping over selected regions.

use super::*;
use crate::playback::{LoopWindow, events};
use approx_eq::assert_approx_eq;

const OVERLAPPING: [Region; 2] = [Region::new(2.0, 5.0), Region::new(3.0, 8.0)];

#[test]
fn test_loop_spans_selected_regions() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);

    h.player.play(None, None);

    assert_eq!(
        h.player.active_loop(),
        Some(LoopWindow { start: 2.0, end: 8.0 })
    );
    assert_eq!(h.player.current_time(), 2.0);
    assert_eq!(
        h.graph.last_start(),
        Some(StartCall {
            when: 0.0,
            offset: 2.0,
            duration: 6.0
        })
    );
}

#[test]
fn test_loop_cycles_until_paused() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);

    // Three full passes over the six second window.
    for _ in 0..18 {
        h.tick(1000.0);
    }

    assert!(h.player.is_playing());
    assert_eq!(h.graph.log().connects, 4);
    assert_eq!(h.events.count(events::PLAY), 4);
    assert_eq!(h.player.current_time(), 2.0);

    h.player.pause();
    assert!(!h.player.is_playing());
    assert!(h.player.active_loop().is_none());
}

#[test]
fn test_positions_stay_inside_loop() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);

    for ms in [700.0, 1300.0, 16.0, 2500.0, 999.0, 4100.0, 33.0, 1800.0] {
        h.tick(ms);
    }

    let positions = h.playing_positions();
    assert!(positions.len() > 8);
    assert!(positions.iter().all(|&t| (2.0..=8.0).contains(&t)));
}

#[test]
fn test_loop_end_is_followed_by_loop_start() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);
    h.tick(5000.0);
    h.events.take();

    // Overshoots the end; the position is held at the end, then wraps.
    h.tick(1700.0);

    assert_eq!(
        h.events.events(),
        vec![
            PlayerEvent::Playing(8.0),
            PlayerEvent::Seek(2.0),
            PlayerEvent::Playing(2.0),
            PlayerEvent::Play,
        ]
    );
    let log = h.graph.log();
    assert_eq!(log.stops, 1);
    assert_eq!(log.starts.last().unwrap().offset, 2.0);
}

#[test]
fn test_selection_is_snapshot_at_play() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);

    h.select(&[Region::new(0.0, 1.0)]);
    h.tick(3000.0);

    assert_eq!(
        h.player.active_loop(),
        Some(LoopWindow { start: 2.0, end: 8.0 })
    );
    assert_approx_eq!(h.player.current_time(), 5.0, 1e-9);
}

#[test]
fn test_pause_clears_loop_and_play_restores_it() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);
    h.tick(3000.0);
    h.player.pause();
    assert!(h.player.active_loop().is_none());

    h.player.play(None, None);

    assert_eq!(
        h.player.active_loop(),
        Some(LoopWindow { start: 2.0, end: 8.0 })
    );
    // Picks up mid-window rather than jumping to the loop start.
    let start = h.graph.last_start().unwrap();
    assert_approx_eq!(start.offset, 5.0, 1e-9);
    assert_approx_eq!(start.duration, 3.0, 1e-9);
}

#[test]
fn test_play_outside_window_clamps_into_it() {
    let mut h = Harness::new(10.0);
    h.player.seek(1.0);
    h.select(&OVERLAPPING);

    h.player.play(None, None);
    assert_eq!(h.player.current_time(), 2.0);
    h.player.stop();

    h.player.seek(9.5);
    h.player.play(None, None);
    // Clamped onto the end, which immediately wraps to the start.
    assert_eq!(h.player.current_time(), 2.0);
    assert!(h.player.is_playing());
}

#[test]
fn test_source_end_is_ignored_while_looping() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);
    h.tick(1000.0);
    h.events.take();

    assert!(h.finish_source());

    assert!(h.player.is_playing());
    assert!(!h.player.is_ended());
    assert!(h.events.is_empty());
}

#[test]
fn test_seek_while_looping_outside_window_goes_to_loop_start() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);
    h.tick(1000.0);

    h.player.seek(9.0);

    assert!(h.player.is_playing());
    assert_eq!(h.player.current_time(), 2.0);
    assert_eq!(h.graph.last_start().unwrap().offset, 2.0);
}

#[test]
fn test_set_current_time_keeps_play_head_in_loop() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);
    h.tick(1000.0);

    h.player.set_current_time(0.5, false);
    assert_eq!(h.player.current_time(), 2.0);

    h.tick(16.0);
    let window = h.player.active_loop().unwrap();
    assert_eq!(window, LoopWindow { start: 2.0, end: 8.0 });
    assert!(window.contains(h.player.current_time()));
    assert_approx_eq!(h.player.current_time(), 2.016, 1e-9);

    h.events.take();
    h.player.set_current_time(6.5, true);
    assert_eq!(h.player.current_time(), 6.5);
    assert_eq!(h.events.take(), vec![PlayerEvent::Seek(6.5)]);

    h.player.set_current_time(9.5, false);
    assert_eq!(h.player.current_time(), 2.0);

    // Without an active loop only the duration bounds the position.
    h.player.pause();
    h.player.set_current_time(0.5, false);
    assert_eq!(h.player.current_time(), 0.5);
}

#[test]
fn test_loop_rereads_selection_on_each_cycle() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.player.play(None, None);

    h.select(&[Region::new(4.0, 6.0)]);
    h.tick(6000.0);

    // The wrap is a fresh `play`, which takes a new snapshot.
    assert_eq!(
        h.player.active_loop(),
        Some(LoopWindow { start: 4.0, end: 6.0 })
    );
    assert_eq!(h.player.current_time(), 4.0);
}

#[test]
fn test_empty_selection_plays_once() {
    let mut h = Harness::new(10.0);
    h.select(&OVERLAPPING);
    h.select(&[]);

    h.player.play(None, None);

    assert!(h.player.active_loop().is_none());
    assert_eq!(h.graph.last_start().unwrap().duration, 10.0);
}

//! End-to-end playback scenarios over sprites loaded from fixtures.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprout_doc::{AniDir, PlayMode, Playback, Sprite, Tag, TagId, Timeline};

const FIXTURE: &str = r#"
total_frames = 10

[[tags]]
id = 1
name = "idle"
from = 0
to = 3

[[tags]]
id = 2
name = "blink"
from = 1
to = 2
ani_dir = "pingpong"

[[tags]]
id = 3
name = "walk"
from = 5
to = 8
ani_dir = "reverse"
repeat = 2
"#;

fn fixture() -> Sprite {
    let sprite: Sprite = toml::from_str(FIXTURE).unwrap();
    sprite.validate().unwrap();
    sprite
}

fn collect(playback: &mut Playback, n: usize) -> Vec<i32> {
    (0..n).map(|_| playback.next_frame(1)).collect()
}

#[test]
fn test_fixture_loads() {
    let sprite = fixture();
    assert_eq!(sprite.total_frames(), 10);
    assert_eq!(sprite.tags().len(), 3);
    assert_eq!(sprite.tag_by_name("blink").unwrap().ani_dir(), AniDir::PingPong);
    assert_eq!(sprite.tag(TagId(3)).unwrap().repeat(), 2);
    assert_eq!(sprite.tag(TagId(1)).unwrap().ani_dir(), AniDir::Forward);
}

#[test]
fn test_fixture_rejects_bad_range() {
    let bad = "total_frames = 4\n[[tags]]\nid = 1\nname = \"x\"\nfrom = 2\nto = 9\n";
    let sprite: Sprite = toml::from_str(bad).unwrap();
    assert!(sprite.validate().is_err());
}

#[test]
fn test_play_all_through_fixture() {
    let sprite = fixture();
    let mut playback = Playback::new(Some(&sprite), 0, PlayMode::PlayAll, None, 1);
    assert_eq!(playback.playing_tags(), [TagId(1)]);

    // blink bounces once inside idle, then walk plays reversed twice.
    let frames = collect(&mut playback, 15);
    assert_eq!(frames, [1, 2, 1, 3, 4, 8, 7, 6, 5, 8, 7, 6, 5, 9, 9]);
    assert!(playback.is_stopped());
    assert_eq!(playback.frame(), 9);
}

#[test]
fn test_play_once_walk() {
    let sprite = fixture();
    let mut playback = Playback::new(Some(&sprite), 0, PlayMode::PlayOnce, Some(TagId(3)), 1);
    assert_eq!(playback.frame(), 8);
    assert_eq!(playback.tag().map(Tag::name), Some("walk"));

    let frames = collect(&mut playback, 8);
    assert_eq!(frames, [7, 6, 5, 8, 7, 6, 5, 0]);
    assert!(playback.is_stopped());
}

#[test]
fn test_loop_idle_tag() {
    let sprite = fixture();
    let mut playback =
        Playback::new(Some(&sprite), 0, PlayMode::PlayInLoop, Some(TagId(1)), 1);

    // The nested blink plays inside every idle lap.
    let frames = collect(&mut playback, 12);
    assert_eq!(frames, [1, 2, 1, 3, 0, 1, 2, 1, 3, 0, 1, 2]);
    assert!(!playback.is_stopped());
}

#[test]
fn test_delete_tag_while_playing() {
    let mut sprite = fixture();
    let mut playback = Playback::new(Some(&sprite), 0, PlayMode::PlayInLoop, None, 1);

    assert_eq!(collect(&mut playback, 2), [1, 2]);
    assert_eq!(playback.playing_tags(), [TagId(1), TagId(2)]);

    // The document drops the tag first, then tells the playback.
    sprite.remove_tag(TagId(2)).unwrap();
    playback.remove_references_to_tag(TagId(2));
    assert_eq!(playback.playing_tags(), [TagId(1)]);
    assert_eq!(playback.tags().len(), sprite.tags().len());

    assert_eq!(collect(&mut playback, 2), [3, 4]);
}

#[test]
fn test_play_once_sprite_stops_on_last_step() {
    let sprite = Sprite::new(6);
    let mut playback = Playback::new(Some(&sprite), 2, PlayMode::PlayOnce, None, 1);

    for expected in 3..6 {
        assert_eq!(playback.next_frame(1), expected);
        assert!(!playback.is_stopped());
    }
    assert_eq!(playback.next_frame(1), 2);
    assert!(playback.is_stopped());
}

#[test]
fn test_multi_frame_delta_matches_single_steps() {
    let sprite = fixture();
    let mut stepped = Playback::new(Some(&sprite), 0, PlayMode::PlayInLoop, None, 1);
    let mut jumped = stepped.clone();

    for _ in 0..7 {
        stepped.next_frame(1);
    }
    assert_eq!(jumped.next_frame(7), stepped.frame());
    assert_eq!(jumped.playing_tags(), stepped.playing_tags());
}

fn random_sprite(rng: &mut StdRng) -> Sprite {
    let total_frames = rng.gen_range(1..16);
    let mut sprite = Sprite::new(total_frames);
    for id in 0..rng.gen_range(0..6) {
        let from = rng.gen_range(0..total_frames);
        let to = rng.gen_range(from..total_frames);
        let ani_dir = match rng.gen_range(0..4) {
            0 => AniDir::Forward,
            1 => AniDir::Reverse,
            2 => AniDir::PingPong,
            _ => AniDir::PingPongReverse,
        };
        let tag = Tag::new(TagId(id), format!("t{id}"), from, to)
            .unwrap()
            .with_ani_dir(ani_dir)
            .with_repeat(rng.gen_range(0..4));
        sprite.add_tag(tag).unwrap();
    }
    sprite
}

#[test]
fn test_random_stepping_stays_in_range() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let modes = [
        PlayMode::PlayAll,
        PlayMode::PlayInLoop,
        PlayMode::PlayWithoutTagsInLoop,
        PlayMode::PlayOnce,
    ];

    for _ in 0..300 {
        let sprite = random_sprite(&mut rng);
        let total = sprite.total_frames();
        let mode = modes[rng.gen_range(0..modes.len())];
        let root = if sprite.tags().is_empty() || rng.gen_bool(0.5) {
            None
        } else {
            Some(sprite.tags()[rng.gen_range(0..sprite.tags().len())].id())
        };
        let forward = if rng.gen_bool(0.5) { 1 } else { -1 };
        let mut playback =
            Playback::new(Some(&sprite), rng.gen_range(0..total), mode, root, forward);

        for _ in 0..200 {
            if rng.gen_bool(0.02) {
                if let Some(tag) = playback.tags().first().map(Tag::id) {
                    playback.remove_references_to_tag(tag);
                    assert!(!playback.playing_tags().contains(&tag));
                    assert!(!playback.was_played(tag));
                }
            }

            let delta = rng.gen_range(-3..=3);
            let frame = playback.next_frame(delta);
            assert!((0..total).contains(&frame), "frame {frame} outside 0..{total}");

            // Every active tag still exists.
            for id in playback.playing_tags() {
                assert!(playback.tags().iter().any(|t| t.id() == id));
            }
            if playback.is_stopped() {
                assert_eq!(playback.next_frame(1), frame);
                break;
            }
        }
    }
}

#[test]
fn test_out_of_range_fixture_tag_is_ignored() {
    let text = "total_frames = 4\n[[tags]]\nid = 1\nname = \"x\"\nfrom = 2\nto = 9\n";
    let sprite: Sprite = toml::from_str(text).unwrap();
    let mut playback = Playback::new(Some(&sprite), 0, PlayMode::PlayAll, None, 1);

    assert!(playback.tags().is_empty());
    assert_eq!(collect(&mut playback, 4), [1, 2, 3, 3]);
    assert!(playback.is_stopped());
}

/// Generous step budget: every tag pass multiplied by its nesting.
fn step_budget(sprite: &Sprite) -> usize {
    let passes = sprite.tags().iter().fold(1_usize, |acc, tag| {
        let passes = match tag.repeat() {
            0 if tag.ani_dir().is_ping_pong() => 2,
            0 => 1,
            n => n as usize,
        };
        acc.saturating_mul(passes + 1)
    });
    (sprite.total_frames() as usize)
        .saturating_mul(passes)
        .saturating_mul(4)
}

#[test]
fn test_random_play_all_and_once_stop() {
    let mut rng = StdRng::seed_from_u64(0x0a11);

    for _ in 0..2_000 {
        let sprite = random_sprite(&mut rng);
        let total = sprite.total_frames();
        let mode = if rng.gen_bool(0.5) {
            PlayMode::PlayAll
        } else {
            PlayMode::PlayOnce
        };
        let root = if sprite.tags().is_empty() || rng.gen_bool(0.5) {
            None
        } else {
            Some(sprite.tags()[rng.gen_range(0..sprite.tags().len())].id())
        };
        let forward = if rng.gen_bool(0.5) { 1 } else { -1 };
        let start = rng.gen_range(0..total);
        let mut playback = Playback::new(Some(&sprite), start, mode, root, forward);

        let budget = step_budget(&sprite);
        let mut taken = 0;
        while !playback.is_stopped() && taken < budget {
            playback.next_frame(1);
            taken += 1;
        }
        assert!(
            playback.is_stopped(),
            "{mode} from {start} (forward {forward}, tag {root:?}) still running after {budget} steps: {sprite:?}"
        );
    }
}

#[test]
fn test_random_loop_visits_untagged_frames() {
    let mut rng = StdRng::seed_from_u64(0x100b);

    for _ in 0..2_000 {
        let sprite = random_sprite(&mut rng);
        let total = sprite.total_frames();
        let forward = if rng.gen_bool(0.5) { 1 } else { -1 };
        let start = rng.gen_range(0..total);
        let mut playback = Playback::new(Some(&sprite), start, PlayMode::PlayInLoop, None, forward);

        let mut missing: Vec<i32> = (0..total)
            .filter(|&f| !sprite.tags().iter().any(|t| t.contains(f)))
            .filter(|&f| f != start)
            .collect();
        let budget = step_budget(&sprite);
        let mut taken = 0;
        while !missing.is_empty() && taken < budget {
            let frame = playback.next_frame(1);
            missing.retain(|&f| f != frame);
            taken += 1;
        }
        assert!(
            missing.is_empty(),
            "frames {missing:?} never shown from {start} (forward {forward}): {sprite:?}"
        );
    }
}

mod common;

use cgmath::{Deg, Rad};
use common::test_utils::{FrameCounter, approx, sample};
use helmet_viewer::{
    animator::{Easing, PointerTarget, TiltAnimator},
    config::TiltConfig,
    viewport::Viewport,
};
use winit::dpi::{PhysicalPosition, PhysicalSize};

fn thirty_degrees() -> f32 {
    Rad::from(Deg(30.0f32)).0
}

#[test]
fn centred_pointer_returns_to_rest_within_the_duration() {
    let mut animator = TiltAnimator::new(&TiltConfig::default());
    animator.point_at(PointerTarget { x: 0.8, y: 0.4 });
    sample(&mut animator, 0.1, 20);
    assert!(animator.is_settled());

    let viewport = Viewport::new(PhysicalSize::new(1280, 720), 1.0, 2.0);
    let target = animator.point_at(viewport.normalize(PhysicalPosition::new(640.0, 360.0)));
    assert_eq!(target.yaw, 0.0);
    assert_eq!(target.pitch, 0.0);

    let mut frames = FrameCounter::default();
    frames.run_until_settled(&mut animator, 600);
    assert!(animator.is_settled());
    // one frame of slack for the accumulated step error
    assert!(frames.elapsed() <= 0.9 + FrameCounter::DT + 1e-3, "took {}s", frames.elapsed());
    assert_eq!(animator.orientation().yaw, 0.0);
    assert_eq!(animator.orientation().pitch, 0.0);
}

#[test]
fn top_right_corner_tilts_to_the_max_angle() {
    let viewport = Viewport::new(PhysicalSize::new(1280, 720), 1.0, 2.0);
    let mut animator = TiltAnimator::new(&TiltConfig::default());

    let target = animator.point_at(viewport.normalize(PhysicalPosition::new(1280.0, 0.0)));
    assert!(approx(target.yaw, thirty_degrees()));
    assert!(approx(target.pitch, -thirty_degrees()));

    let mut frames = FrameCounter::default();
    frames.run_until_settled(&mut animator, 600);
    let settled = animator.orientation();
    assert!(approx(settled.yaw, thirty_degrees()));
    assert!(approx(settled.pitch, -thirty_degrees()));
}

#[test]
fn transition_eases_out() {
    let mut animator = TiltAnimator::new(&TiltConfig::default());
    animator.point_at(PointerTarget { x: 1.0, y: 0.0 });
    let yaws: Vec<f32> = sample(&mut animator, 0.09, 10).iter().map(|o| o.yaw).collect();

    // monotonic toward the target, with shrinking steps
    for pair in yaws.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    // cubic ease-out: 87.5% of the swing is covered at the halfway point
    assert!(approx(yaws[4], 0.875 * thirty_degrees()));
    let first_step = yaws[0];
    let late_step = yaws[8] - yaws[7];
    assert!(first_step > late_step);
    assert!(approx(yaws[9], thirty_degrees()));
}

#[test]
fn rapid_retargeting_is_continuous_and_converges() {
    let mut animator = TiltAnimator::new(&TiltConfig::default());
    let pointers = [
        PointerTarget { x: 1.0, y: 1.0 },
        PointerTarget { x: -1.0, y: -0.5 },
        PointerTarget { x: 0.2, y: 0.9 },
        PointerTarget { x: -0.6, y: 0.1 },
    ];

    let mut previous = animator.orientation();
    for pointer in pointers {
        animator.point_at(pointer);
        // a retarget never makes the sampled value jump
        assert_eq!(animator.orientation(), previous);
        for orientation in sample(&mut animator, FrameCounter::DT, 5) {
            // 5° per frame is far more than a 30° swing over 0.9s can ask for
            assert!((orientation.yaw - previous.yaw).abs() < Rad::from(Deg(5.0f32)).0);
            assert!((orientation.pitch - previous.pitch).abs() < Rad::from(Deg(5.0f32)).0);
            previous = orientation;
        }
    }

    let last = animator.target();
    let mut frames = FrameCounter::default();
    frames.run_until_settled(&mut animator, 600);
    assert!(frames.frame() < 600);
    assert!(approx(animator.orientation().yaw, last.yaw));
    assert!(approx(animator.orientation().pitch, last.pitch));
    assert!(approx(last.yaw, -0.6 * thirty_degrees()));
    assert!(approx(last.pitch, 0.1 * thirty_degrees()));
}

#[test]
fn custom_tilt_config_is_honoured() {
    let config = TiltConfig {
        max_angle: Deg(10.0f32).into(),
        duration: 0.25,
        easing: Easing::Linear,
    };
    let mut animator = TiltAnimator::new(&config);
    animator.point_at(PointerTarget { x: -1.0, y: 1.0 });
    // linear: halfway through the duration is halfway there
    animator.update(0.125);
    assert!(approx(animator.orientation().yaw, -Rad::from(Deg(5.0f32)).0));
    sample(&mut animator, 0.05, 6);
    assert!(animator.is_settled());
    assert!(approx(animator.orientation().yaw, -Rad::from(Deg(10.0f32)).0));
    assert!(approx(animator.orientation().pitch, Rad::from(Deg(10.0f32)).0));
}

#[test]
fn pointer_outside_the_window_stays_bounded() {
    let viewport = Viewport::new(PhysicalSize::new(640, 480), 1.0, 2.0);
    let animator = TiltAnimator::new(&TiltConfig::default());
    for (x, y) in [(-100.0, -100.0), (5000.0, 240.0), (320.0, -1.0), (641.0, 481.0)] {
        let target = animator.target_for(viewport.normalize(PhysicalPosition::new(x, y)));
        assert!(target.yaw.abs() <= thirty_degrees() + 1e-6);
        assert!(target.pitch.abs() <= thirty_degrees() + 1e-6);
    }
}

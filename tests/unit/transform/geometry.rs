use super::*;

fn geom(x: f64, y: f64, w: f64, h: f64) -> Geometry {
    Geometry {
        x,
        y,
        width: w,
        height: h,
        ..Geometry::default()
    }
}

#[test]
fn hit_test_is_axis_aligned_and_ignores_rotation() {
    let mut g = geom(10.0, 10.0, 100.0, 50.0);
    assert!(hit_test(&g, true, Point::new(10.0, 10.0)));
    assert!(hit_test(&g, true, Point::new(110.0, 60.0)));
    assert!(!hit_test(&g, true, Point::new(111.0, 30.0)));
    assert!(!hit_test(&g, false, Point::new(50.0, 30.0)));

    g.rotation = 45.0;
    assert!(hit_test(&g, true, Point::new(12.0, 12.0)));
}

#[test]
fn handles_are_corners_and_midpoints() {
    let g = geom(0.0, 0.0, 100.0, 40.0);
    let hs = g.handles();
    assert_eq!(hs.len(), 8);
    assert_eq!(hs[0], (Handle::Nw, Point::new(0.0, 0.0)));
    assert_eq!(g.handle_position(Handle::E), Point::new(100.0, 20.0));
    assert_eq!(g.handle_position(Handle::S), Point::new(50.0, 40.0));
    assert_eq!(g.handle_at(Point::new(95.0, 36.0)), Some(Handle::Se));
    assert_eq!(g.handle_at(Point::new(30.0, 20.0)), None);
}

#[test]
fn resize_follows_handle_rules() {
    let mut g = geom(100.0, 100.0, 200.0, 100.0);
    g.resize(Handle::Nw, 10.0, 5.0);
    assert_eq!((g.x, g.y, g.width, g.height), (110.0, 105.0, 190.0, 95.0));

    let mut g = geom(100.0, 100.0, 200.0, 100.0);
    g.resize(Handle::E, 25.0, 40.0);
    assert_eq!((g.x, g.y, g.width, g.height), (100.0, 100.0, 225.0, 100.0));

    let mut g = geom(100.0, 100.0, 200.0, 100.0);
    g.resize(Handle::Sw, -10.0, 10.0);
    assert_eq!((g.x, g.y, g.width, g.height), (90.0, 100.0, 210.0, 110.0));

    let mut g = geom(100.0, 100.0, 200.0, 100.0);
    g.resize(Handle::Ne, 10.0, 10.0);
    assert_eq!((g.x, g.y, g.width, g.height), (100.0, 110.0, 210.0, 90.0));
}

#[test]
fn resize_never_goes_below_floor() {
    for h in Handle::ALL {
        for &(dx, dy) in &[(-1000.0, -1000.0), (1000.0, 1000.0), (-7.0, 3.0), (500.0, -500.0)] {
            let mut g = geom(0.0, 0.0, 50.0, 50.0);
            g.resize(h, dx, dy);
            assert!(g.width >= MIN_SIZE, "{h:?} {dx} {dy}");
            assert!(g.height >= MIN_SIZE, "{h:?} {dx} {dy}");
        }
    }
}

#[test]
fn rotation_stays_in_range() {
    let c = Point::new(0.0, 0.0);
    assert_eq!(rotation_toward(c, Point::new(0.0, -10.0)), 0.0);
    assert!((rotation_toward(c, Point::new(10.0, 0.0)) - 90.0).abs() < 1e-9);
    assert!((rotation_toward(c, Point::new(-10.0, 0.0)) - 270.0).abs() < 1e-9);
    for i in 0..64 {
        let a = f64::from(i) * 0.37;
        let r = rotation_toward(c, Point::new(a.cos(), a.sin()));
        assert!((0.0..360.0).contains(&r));
    }
    assert_eq!(normalize_degrees(-1e-20), 0.0);
    assert_eq!(normalize_degrees(720.0), 0.0);
    assert_eq!(normalize_degrees(f64::NAN), 0.0);
}

#[test]
fn crop_is_clamped_to_source_size() {
    let c = Crop {
        top: 30.0,
        left: 80.0,
        right: 80.0,
        bottom: -5.0,
    };
    let cl = c.clamped(100.0, 40.0);
    assert_eq!(cl.left, 80.0);
    assert_eq!(cl.right, 20.0);
    assert_eq!(cl.bottom, 0.0);
    let r = c.visible_rect(100.0, 40.0);
    assert!(r.width() >= 0.0 && r.height() >= 0.0);
}

#[test]
fn local_to_world_maps_corners_without_rotation() {
    let g = geom(10.0, 20.0, 100.0, 50.0);
    let xf = g.local_to_world();
    let p = xf * Point::new(0.0, 0.0);
    assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 20.0).abs() < 1e-9);
    let p = xf * Point::new(100.0, 50.0);
    assert!((p.x - 110.0).abs() < 1e-9 && (p.y - 70.0).abs() < 1e-9);
}

#[test]
fn snap_rounds_to_grid() {
    let mut g = geom(23.0, 77.0, 50.0, 50.0);
    g.snap_to_grid(50.0);
    assert_eq!((g.x, g.y), (0.0, 100.0));
}

#[test]
fn handle_names_parse() {
    assert_eq!("se".parse::<Handle>().unwrap(), Handle::Se);
    assert!("middle".parse::<Handle>().is_err());
}

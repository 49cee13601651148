use std::rc::Rc;

use anyhow::Result;
use drift_scene::{
    ChildList, ContainerReflow, Curve, Element, ElementRef, Fade, Orientation, ReflowConfig,
    Scheduler, SceneNode, Size, TransitionAnimation,
};

fn row(name: &str, height: f64) -> Rc<SceneNode> {
    Rc::new(SceneNode::new(name, Size::new(200.0, height)))
}

fn linear(spacing: f64) -> ReflowConfig {
    ReflowConfig::default()
        .with_spacing(spacing)
        .with_relocation_curve(Curve::Linear)
}

/// On-screen top edge of `id`: its layout position plus its offset.
fn top(list: &ChildList, spacing: f64, id: drift_scene::ElementId) -> f64 {
    let mut layout = 0.0;
    for element in list.to_vec() {
        if element.id() == id {
            return layout + element.translate(Orientation::Vertical).get();
        }
        layout += element.size().height + spacing;
    }
    panic!("{id} is not in the list");
}

fn fade_in(ms: f64) -> Option<TransitionAnimation> {
    Some(TransitionAnimation::new(Fade::fade_in(ms)))
}

fn fade_out(ms: f64) -> Option<TransitionAnimation> {
    Some(TransitionAnimation::new(Fade::fade_out(ms)))
}

#[test]
fn insertion_slides_followers_from_gap() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let (a, b) = (row("a", 20.0), row("b", 20.0));
    list.push(a.clone())?;
    list.push(b.clone())?;
    let reflow = ContainerReflow::new(list.clone(), &scheduler, linear(10.0), fade_in(300.0), None)?;

    let inserted = row("new", 40.0);
    list.insert(0, inserted.clone())?;
    assert_eq!(inserted.opacity().get(), 0.0);

    scheduler.run_deferred();
    assert_eq!(a.translate_y().get(), -50.0);
    assert_eq!(b.translate_y().get(), -50.0);
    assert_eq!(reflow.active_passes(), 1);
    assert_eq!(reflow.relocating_count(), 2);

    scheduler.advance(150.0);
    assert!((a.translate_y().get() + 25.0).abs() < 1e-9);
    assert!((inserted.opacity().get() - 0.5).abs() < 1e-9);

    scheduler.advance(150.0);
    assert_eq!(a.translate_y().get(), 0.0);
    assert_eq!(b.translate_y().get(), 0.0);
    assert_eq!(inserted.opacity().get(), 1.0);
    assert_eq!(reflow.relocating_count(), 0);
    assert!(scheduler.is_idle());
    Ok(())
}

#[test]
fn removal_waits_for_exit() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let rows: Vec<Rc<SceneNode>> = (0..3).map(|i| row(&format!("r{i}"), 30.0)).collect();
    for r in &rows {
        list.push(r.clone())?;
    }
    let reflow = ContainerReflow::new(list.clone(), &scheduler, linear(5.0), None, fade_out(200.0))?;

    let removed = list.remove(1)?;
    assert_eq!(removed.id(), rows[1].id());
    assert_eq!(list.index_of(rows[1].id()), Some(1));

    let mut frames = 0;
    while list.contains(rows[1].id()) {
        scheduler.advance(20.0);
        frames += 1;
        assert!(frames <= 10, "exit never completed");
        if list.contains(rows[1].id()) {
            assert!(rows[2].translate_y().get() <= 0.0);
            assert_eq!(rows[0].translate_y().get(), 0.0);
        }
    }
    assert_eq!(frames, 10);
    assert_eq!(list.ids(), vec![rows[0].id(), rows[2].id()]);
    assert_eq!(rows[2].translate_y().get(), 0.0);
    assert_eq!(reflow.skip_set_len(), 0);
    Ok(())
}

#[test]
fn churn_leaves_no_bookkeeping_behind() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let (a, b, c) = (row("a", 10.0), row("b", 20.0), row("c", 30.0));
    for r in [&a, &b, &c] {
        list.push(r.clone())?;
    }
    let reflow =
        ContainerReflow::new(list.clone(), &scheduler, linear(4.0), fade_in(100.0), fade_out(100.0))?;

    list.remove(1)?;
    let d = row("d", 15.0);
    list.insert(0, d.clone())?;
    list.remove(0)?;
    let e = row("e", 25.0);
    list.push(e.clone())?;
    assert_eq!(reflow.skip_set_len(), 2);

    scheduler.run_until_idle(16.0, 100);

    assert_eq!(list.ids(), vec![a.id(), c.id(), e.id()]);
    assert_eq!(reflow.skip_set_len(), 0);
    assert_eq!(reflow.relocating_count(), 0);
    assert_eq!(reflow.pending_exits(), 0);
    for r in [&a, &c, &e] {
        assert_eq!(r.translate_y().get(), 0.0, "{} left displaced", r.name());
    }
    Ok(())
}

#[test]
fn newer_pass_takes_over_sibling() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let tail = row("tail", 10.0);
    list.push(tail.clone())?;
    let reflow = ContainerReflow::new(list.clone(), &scheduler, linear(0.0), fade_in(100.0), None)?;

    list.insert(0, row("first", 40.0))?;
    scheduler.advance(50.0);
    assert!((tail.translate_y().get() + 20.0).abs() < 1e-9);

    list.insert(0, row("second", 40.0))?;
    scheduler.run_deferred();
    // Continues from the current offset, shifted by the new gap.
    assert!((tail.translate_y().get() + 60.0).abs() < 1e-9);
    assert_eq!(reflow.active_passes(), 2);
    assert_eq!(reflow.relocating_count(), 2);

    scheduler.run_until_idle(10.0, 100);
    assert_eq!(tail.translate_y().get(), 0.0);
    assert_eq!(reflow.active_passes(), 0);
    Ok(())
}

#[test]
fn relocation_duration_override() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let tail = row("tail", 10.0);
    list.push(tail.clone())?;
    let config = linear(0.0).with_relocation_duration(400.0);
    let _reflow = ContainerReflow::new(list.clone(), &scheduler, config, fade_in(100.0), None)?;

    list.insert(0, row("head", 40.0))?;
    scheduler.advance(200.0);
    assert!((tail.translate_y().get() + 20.0).abs() < 1e-9);
    scheduler.advance(200.0);
    assert_eq!(tail.translate_y().get(), 0.0);
    Ok(())
}

#[test]
fn dropping_engine_settles_everything() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let (a, b) = (row("a", 20.0), row("b", 20.0));
    list.push(a.clone())?;
    list.push(b.clone())?;
    let reflow = ContainerReflow::new(list.clone(), &scheduler, linear(0.0), None, fade_out(100.0))?;

    list.remove(0)?;
    scheduler.advance(40.0);
    assert!(b.translate_y().get() < 0.0);

    drop(reflow);
    let remaining: Vec<ElementRef> = list.to_vec();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), b.id());
    assert_eq!(b.translate_y().get(), 0.0);
    assert!(scheduler.is_idle());

    // The list is plain again.
    list.remove(0)?;
    assert!(list.is_empty());
    Ok(())
}

#[test]
fn insertion_during_removal_keeps_siblings_continuous() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let (exiting, sibling) = (row("exiting", 50.0), row("sibling", 10.0));
    list.push(exiting.clone())?;
    list.push(sibling.clone())?;
    let reflow =
        ContainerReflow::new(list.clone(), &scheduler, linear(0.0), fade_in(100.0), fade_out(100.0))?;

    list.remove(0)?;
    scheduler.advance(50.0);
    assert!((top(&list, 0.0, sibling.id()) - 25.0).abs() < 1e-9);

    let inserted = row("inserted", 40.0);
    list.insert(0, inserted.clone())?;

    let mut previous = 25.0;
    for frame in 0..20 {
        scheduler.advance(10.0);
        let current = top(&list, 0.0, sibling.id());
        assert!(
            (current - previous).abs() <= 5.0,
            "sibling jumped from {previous} to {current} in frame {frame}"
        );
        previous = current;
    }

    assert_eq!(list.ids(), vec![inserted.id(), sibling.id()]);
    assert_eq!(sibling.translate_y().get(), 0.0);
    assert_eq!(top(&list, 0.0, sibling.id()), 40.0);
    assert_eq!(reflow.relocating_count(), 0);
    assert!(scheduler.is_idle());
    Ok(())
}

#[test]
fn delayed_exit_holds_siblings_until_it_plays() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let (exiting, sibling) = (row("exiting", 20.0), row("sibling", 20.0));
    list.push(exiting.clone())?;
    list.push(sibling.clone())?;
    let exit = TransitionAnimation::new(Fade::fade_out(100.0)).with_delay(100.0);
    let reflow = ContainerReflow::new(list.clone(), &scheduler, linear(0.0), None, Some(exit))?;

    list.remove(0)?;
    let mut previous = top(&list, 0.0, sibling.id());
    let mut elapsed = 0.0;
    while list.contains(exiting.id()) {
        scheduler.advance(20.0);
        elapsed += 20.0;
        assert!(elapsed <= 200.0, "exit never completed");
        let current = top(&list, 0.0, sibling.id());
        if elapsed <= 100.0 {
            assert_eq!(current, 20.0, "sibling moved during the exit delay");
        }
        assert!(
            current <= previous + 1e-9,
            "sibling moved back from {previous} to {current} at {elapsed}ms"
        );
        previous = current;
    }

    assert_eq!(elapsed, 200.0);
    assert_eq!(sibling.translate_y().get(), 0.0);
    assert_eq!(top(&list, 0.0, sibling.id()), 0.0);
    assert_eq!(reflow.relocating_count(), 0);
    assert_eq!(reflow.skip_set_len(), 0);
    Ok(())
}

#[test]
fn parked_siblings_settle_when_exit_outlasts_relocation() -> Result<()> {
    let scheduler = Scheduler::new();
    let list = ChildList::new();
    let (exiting, sibling) = (row("exiting", 30.0), row("sibling", 10.0));
    list.push(exiting.clone())?;
    list.push(sibling.clone())?;
    let config = linear(0.0).with_relocation_duration(50.0);
    let reflow = ContainerReflow::new(list.clone(), &scheduler, config, None, fade_out(100.0))?;

    list.remove(0)?;
    scheduler.advance(60.0);
    assert_eq!(sibling.translate_y().get(), -30.0);
    assert_eq!(reflow.active_passes(), 0);
    assert_eq!(reflow.relocating_count(), 1);

    scheduler.advance(40.0);
    assert_eq!(list.ids(), vec![sibling.id()]);
    assert_eq!(sibling.translate_y().get(), 0.0);
    assert_eq!(reflow.relocating_count(), 0);
    Ok(())
}

use std::rc::Rc;

use anyhow::{Context, Result};
use drift_config::DriftConfig;
use drift_scene::{
    AnimatedGroup, AnimationProperty, ChildList, ContainerReflow, Element, ElementRef, Fade,
    LifecycleEvent, ListenableAnimation, Liveness, OnDemandProperty, Orientation, Scheduler,
    SceneNode, Size, Switcher, TransitionAnimation,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = DriftConfig::load().context("loading drift configuration")?;
    info!(
        duration_ms = config.animation.duration_ms,
        curve = %config.animation.curve,
        "configuration loaded"
    );

    let scheduler = Scheduler::new();
    animate_card(&scheduler, &config)?;
    reflow_list(&scheduler, &config)?;
    switch_pages(&scheduler, &config)?;
    Ok(())
}

/// Fade and slide one node with a pair of grouped properties.
fn animate_card(scheduler: &Scheduler, config: &DriftConfig) -> Result<()> {
    let card = Rc::new(SceneNode::new("card", Size::new(240.0, 80.0)));
    let liveness: Rc<dyn Liveness> = card.clone();

    let group = AnimatedGroup::new(liveness)
        .with(AnimationProperty::new(card.opacity(), scheduler, config.animation_settings())?)?
        .with(AnimationProperty::new(card.translate_x(), scheduler, config.animation_settings())?)?;
    group.on_animation_started(|event: &LifecycleEvent| {
        info!(timeline = %event.timeline_id, interrupted = event.interrupted, "card animation started");
    });
    group.on_animation_ended(|event: &LifecycleEvent| {
        info!(timeline = %event.timeline_id, interrupted = event.interrupted, "card animation ended");
    });

    card.opacity().set(0.25);
    card.translate_x().set(120.0);
    let frames = scheduler.run_until_idle(config.frame.interval_ms, config.frame.max_frames);
    info!(
        frames,
        opacity = card.opacity().get(),
        x = card.translate_x().get(),
        "card settled"
    );
    Ok(())
}

/// Insert into and remove from an animated list.
fn reflow_list(scheduler: &Scheduler, config: &DriftConfig) -> Result<()> {
    let list = ChildList::new();
    let rows: Vec<Rc<SceneNode>> = (0..3)
        .map(|i| Rc::new(SceneNode::new(format!("row-{i}"), Size::new(200.0, 32.0))))
        .collect();
    for row in &rows {
        list.push(row.clone())?;
    }

    let duration = config.animation.duration_ms;
    let reflow = ContainerReflow::new(
        list.clone(),
        scheduler,
        config.reflow_config(),
        Some(TransitionAnimation::new(Fade::fade_in(duration))),
        Some(TransitionAnimation::new(Fade::fade_out(duration))),
    )?;

    let banner = Rc::new(SceneNode::new("banner", Size::new(200.0, 48.0)));
    list.insert(0, banner)?;
    list.remove(2)?;
    info!(children = list.len(), "list changed, exit in flight");

    let frames = scheduler.run_until_idle(config.frame.interval_ms, config.frame.max_frames);
    let names: Vec<String> = rows
        .iter()
        .filter(|row| list.contains(row.id()))
        .map(|row| row.name().to_owned())
        .collect();
    info!(frames, children = list.len(), ?names, "list settled");

    reflow.dispose();
    Ok(())
}

/// Cross-fade between pages while an on-demand property follows the page shown.
fn switch_pages(scheduler: &Scheduler, config: &DriftConfig) -> Result<()> {
    let switcher = Switcher::fade(scheduler, config.animation.duration_ms)?;
    let slide = OnDemandProperty::new(
        |page: &ElementRef| page.translate(Orientation::Vertical),
        scheduler,
        config.animation_settings(),
    )?;
    slide.attach_to(switcher.child_slot())?;

    let home = Rc::new(SceneNode::new("home", Size::new(320.0, 480.0)));
    let settings = Rc::new(SceneNode::new("settings", Size::new(320.0, 480.0)));
    switcher.of(home)?;
    switcher.set_child(Some(settings.clone() as ElementRef));
    settings.translate_y().set(24.0);
    info!(children = switcher.children().len(), "page switch in flight");

    let frames = scheduler.run_until_idle(config.frame.interval_ms, config.frame.max_frames);
    info!(
        frames,
        children = switcher.children().len(),
        y = settings.translate_y().get(),
        "page switch settled"
    );
    Ok(())
}

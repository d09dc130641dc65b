//! Space Flow
//!
//! This demo drives a small space-launch browser through the navigation
//! stack, the way a game loop would.
//!
//! Key concepts:
//! - A root state that is never popped
//! - Background loading bound to a state's cancellation token
//! - Recovering from a failed load through an error state
//! - Passing a selected record to a popup through its scope
//! - A per-frame simulation that only ticks while on top
//!
//! Run with: cargo run --example space_flow

use async_trait::async_trait;
use navstack::core::{Bindings, Scope, State, StateContext, StateError, StateTemplate};
use navstack::{MachineEvent, StateMachineBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

// Domain data

#[derive(Clone, Debug)]
struct LaunchRecord {
    mission: String,
    vehicle: String,
    payloads: Vec<String>,
}

#[derive(Clone, Debug)]
struct Catalog {
    launches: Vec<LaunchRecord>,
}

#[derive(Clone, Debug)]
struct LoadError(String);

struct QuitFlag(AtomicBool);

/// Every screen the app can push, bound once in the root scope.
#[derive(Clone)]
struct Screens {
    boot: StateTemplate,
    loading_error: StateTemplate,
    main_menu: StateTemplate,
    launches: StateTemplate,
    payload_popup: StateTemplate,
    solar: StateTemplate,
}

impl Screens {
    fn new() -> Self {
        Self {
            boot: StateTemplate::new("Boot", |_scope: &Scope| Ok(Boot::default())),
            loading_error: StateTemplate::new("LoadingError", |scope: &Scope| {
                Ok(LoadingError {
                    error: scope.resolve::<LoadError>()?,
                    frames: 0,
                })
            }),
            main_menu: StateTemplate::new("MainMenu", |_scope: &Scope| Ok(MainMenu::default())),
            launches: StateTemplate::new("Launches", |scope: &Scope| {
                Ok(Launches {
                    catalog: scope.resolve::<Catalog>()?,
                    opened: false,
                })
            }),
            payload_popup: StateTemplate::new("PayloadPopup", |scope: &Scope| {
                Ok(PayloadPopup {
                    record: scope.resolve::<LaunchRecord>()?,
                })
            }),
            solar: StateTemplate::new("SolarSimulation", |_scope: &Scope| {
                Ok(SolarSimulation::new())
            }),
        }
    }
}

// Simulated remote service

async fn fetch_launches(attempt: u32) -> Result<Catalog, LoadError> {
    tokio::time::sleep(Duration::from_millis(40)).await;
    if attempt < 2 {
        return Err(LoadError("launch service unreachable".to_string()));
    }
    Ok(Catalog {
        launches: vec![
            LaunchRecord {
                mission: "CRS-20".to_string(),
                vehicle: "Falcon 9".to_string(),
                payloads: vec!["Dragon C112".to_string(), "Bartolomeo".to_string()],
            },
            LaunchRecord {
                mission: "Starlink-5".to_string(),
                vehicle: "Falcon 9".to_string(),
                payloads: vec!["Starlink v1.0 x60".to_string()],
            },
        ],
    })
}

// States

struct AppRoot;

#[async_trait]
impl State for AppRoot {
    fn name(&self) -> &str {
        "AppRoot"
    }

    async fn enter(&mut self, ctx: &StateContext) -> Result<(), StateError> {
        let screens = ctx.get::<Screens>()?;
        ctx.request_push(screens.boot.clone());
        Ok(())
    }
}

#[derive(Default)]
struct Boot {
    attempt: u32,
    loaded: bool,
    pending: Option<oneshot::Receiver<Result<Catalog, LoadError>>>,
}

impl Boot {
    fn start_loading(&mut self, ctx: &StateContext) {
        self.attempt += 1;
        let attempt = self.attempt;
        let token = ctx.cancellation().clone();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => info!(attempt, "Launch fetch cancelled"),
                result = fetch_launches(attempt) => {
                    let _ = tx.send(result);
                }
            }
        });

        info!(attempt, "Fetching launches");
        self.pending = Some(rx);
    }
}

#[async_trait]
impl State for Boot {
    fn name(&self) -> &str {
        "Boot"
    }

    async fn enter(&mut self, ctx: &StateContext) -> Result<(), StateError> {
        self.start_loading(ctx);
        Ok(())
    }

    async fn on_resume(&mut self, ctx: &StateContext) -> Result<(), StateError> {
        if !self.loaded {
            self.start_loading(ctx);
        }
        Ok(())
    }

    fn tick(&mut self, ctx: &StateContext) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.pending = None;
                return;
            }
        };
        self.pending = None;

        let Ok(screens) = ctx.get::<Screens>() else {
            return;
        };
        match result {
            Ok(catalog) => {
                self.loaded = true;
                info!(launches = catalog.launches.len(), "Launches loaded");
                ctx.request_push_with(screens.main_menu.clone(), Bindings::new().with(catalog));
            }
            Err(error) => {
                ctx.request_push_with(screens.loading_error.clone(), Bindings::new().with(error));
            }
        }
    }
}

struct LoadingError {
    error: LoadError,
    frames: u32,
}

#[async_trait]
impl State for LoadingError {
    fn name(&self) -> &str {
        "LoadingError"
    }

    async fn enter(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        warn!(reason = %self.error.0, "Showing loading error");
        Ok(())
    }

    fn tick(&mut self, ctx: &StateContext) {
        // The player presses "Retry" after a few frames.
        self.frames += 1;
        if self.frames == 3 {
            ctx.request_pop();
        }
    }
}

#[derive(Default)]
struct MainMenu {
    stage: u8,
    waiting: bool,
}

#[async_trait]
impl State for MainMenu {
    fn name(&self) -> &str {
        "MainMenu"
    }

    async fn on_resume(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        self.stage += 1;
        self.waiting = false;
        Ok(())
    }

    fn tick(&mut self, ctx: &StateContext) {
        if self.waiting {
            return;
        }
        let Ok(screens) = ctx.get::<Screens>() else {
            return;
        };
        match self.stage {
            0 => ctx.request_push(screens.launches.clone()),
            1 => ctx.request_push(screens.solar.clone()),
            _ => {
                if let Ok(quit) = ctx.get::<QuitFlag>() {
                    quit.0.store(true, Ordering::SeqCst);
                }
                return;
            }
        }
        self.waiting = true;
    }
}

struct Launches {
    catalog: Catalog,
    opened: bool,
}

#[async_trait]
impl State for Launches {
    fn name(&self) -> &str {
        "Launches"
    }

    async fn enter(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        for launch in &self.catalog.launches {
            info!(mission = %launch.mission, vehicle = %launch.vehicle, "Listing launch");
        }
        Ok(())
    }

    async fn on_resume(&mut self, ctx: &StateContext) -> Result<(), StateError> {
        ctx.request_pop();
        Ok(())
    }

    fn tick(&mut self, ctx: &StateContext) {
        if self.opened {
            return;
        }
        let Some(selected) = self.catalog.launches.first().cloned() else {
            ctx.request_pop();
            return;
        };
        if let Ok(screens) = ctx.get::<Screens>() {
            ctx.request_push_with(screens.payload_popup.clone(), Bindings::new().with(selected));
            self.opened = true;
        }
    }
}

struct PayloadPopup {
    record: LaunchRecord,
}

#[async_trait]
impl State for PayloadPopup {
    fn name(&self) -> &str {
        "PayloadPopup"
    }

    async fn enter(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        info!(
            mission = %self.record.mission,
            payloads = ?self.record.payloads,
            "Showing payloads"
        );
        Ok(())
    }

    fn tick(&mut self, ctx: &StateContext) {
        ctx.request_pop();
    }
}

struct Planet {
    name: &'static str,
    period_days: f64,
    angle: f64,
}

struct SolarSimulation {
    planets: Vec<Planet>,
    day: f64,
}

impl SolarSimulation {
    const DAYS_PER_TICK: f64 = 10.0;
    const DURATION_DAYS: f64 = 365.0;

    fn new() -> Self {
        let planet = |name, period_days| Planet {
            name,
            period_days,
            angle: 0.0,
        };
        Self {
            planets: vec![
                planet("Mercury", 88.0),
                planet("Venus", 224.7),
                planet("Earth", 365.25),
                planet("Mars", 687.0),
            ],
            day: 0.0,
        }
    }
}

#[async_trait]
impl State for SolarSimulation {
    fn name(&self) -> &str {
        "SolarSimulation"
    }

    fn tick(&mut self, ctx: &StateContext) {
        if ctx.is_cancelled() {
            return;
        }
        self.day += Self::DAYS_PER_TICK;
        for planet in &mut self.planets {
            planet.angle =
                (planet.angle + 360.0 * Self::DAYS_PER_TICK / planet.period_days) % 360.0;
        }
        if self.day >= Self::DURATION_DAYS {
            for planet in &self.planets {
                info!(planet = planet.name, angle = %format!("{:.1}", planet.angle), "Orbit");
            }
            ctx.request_pop();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    println!("=== Space Flow ===\n");

    let mut machine = StateMachineBuilder::new()
        .label("space-flow")
        .on_event(|event| {
            if let MachineEvent::PushFailed { template, reason } = event {
                println!("  push of {template} failed: {reason}");
            }
        })
        .build()?;

    let app = CancellationToken::new();
    let root_scope = Scope::root("app").with_bindings(
        Bindings::new()
            .with(Screens::new())
            .with(QuitFlag(AtomicBool::new(false))),
    );
    let quit = root_scope.get::<QuitFlag>()?;

    machine.push_first(AppRoot, root_scope, app.clone()).await?;

    let mut frames = 0u32;
    while !quit.0.load(Ordering::SeqCst) && frames < 600 {
        machine.tick();
        machine.run_pending().await?;
        tokio::time::sleep(Duration::from_millis(16)).await;
        frames += 1;
    }

    println!("\nStack after {frames} frames: {:?}", machine.state_names());
    println!("Path: {}", machine.history().path().join(" -> "));
    println!("{}", machine.snapshot().to_json()?);

    app.cancel();
    machine.shutdown();

    println!("\n=== Demo Complete ===");
    Ok(())
}

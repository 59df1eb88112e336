/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Drives a headless shell through a scripted list of navigations and prints
//! the slot table after each step.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bpaf::Bpaf;
use log::{info, warn};
use pageshell::diagnostics::install_global_channel;
use pageshell::prefs::ShellPrefs;
use pageshell::registries::{ControllerRegistry, NativeControllerRegistration, PageController};
use pageshell::shell::{
    ContentSource, DirectoryContentSource, RouteDefinition, Router, SlotState,
    StaticContentSource, ViewContext, ViewEvent, ViewManager,
};
use pageshell::view::HeadlessViewTree;
use pageshell::{ViewContainer, ViewError};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Cli {
    /// Preferences file (TOML)
    #[bpaf(long, argument("FILE"))]
    prefs: Option<PathBuf>,
    /// Read page files from this directory instead of the built-in pages
    #[bpaf(long, argument("DIR"))]
    pages: Option<PathBuf>,
    /// Log filter, e.g. `pageshell=debug`
    #[bpaf(long, argument("FILTER"))]
    log: Option<String>,
    /// Navigation steps: a route path, `back` or `reset`
    #[bpaf(positional("STEP"))]
    steps: Vec<String>,
}

const DEFAULT_STEPS: [&str; 7] = [
    "/home.html",
    "/list.html?parentId=1",
    "/details?id=1",
    "/mypreferencesmenu.html",
    "back",
    "back",
    "back",
];

struct LoggingController {
    name: &'static str,
}

impl PageController for LoggingController {
    fn on_view_event(&mut self, event: &ViewEvent) {
        info!("{}: {} {}", self.name, event.kind.as_str(), event.url);
    }
}

fn home_controller(_ctx: &ViewContext) -> Box<dyn PageController> {
    Box::new(LoggingController { name: "home" })
}

fn list_controller(_ctx: &ViewContext) -> Box<dyn PageController> {
    Box::new(LoggingController { name: "list" })
}

inventory::submit! {
    NativeControllerRegistration { path: "home/home", create: home_controller }
}

inventory::submit! {
    NativeControllerRegistration { path: "list", create: list_controller }
}

fn demo_routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new("/home.html")
            .with_type("home")
            .with_controller("home/home"),
        RouteDefinition::new("/list.html")
            .with_controller("list")
            .with_content_query_string(),
        RouteDefinition::new("/details").with_content_path("/itemdetails.html"),
        RouteDefinition::new("/mypreferencesmenu.html"),
    ]
}

fn demo_pages() -> StaticContentSource {
    StaticContentSource::new()
        .with_page("/home.html", r#"<div data-role="page" data-title="Home"></div>"#)
        .with_page("/list.html", r#"<div data-role="page" data-title="Library"></div>"#)
        .with_page(
            "/itemdetails.html",
            r#"<div data-role="page" data-title="Details"></div>"#,
        )
        .with_page(
            "/mypreferencesmenu.html",
            r#"<div data-role="page" data-title="Settings"></div>"#,
        )
}

fn init_logging(filter: Option<&str>) {
    let filter = filter.unwrap_or("pageshell=info");
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        eprintln!("pageshell: logging already initialised");
    }
}

fn print_slots(router: &Router<HeadlessViewTree>) {
    for slot in router.manager().container().slot_snapshots() {
        let marker = match slot.state {
            SlotState::Mounted => "*",
            SlotState::Hidden => " ",
            SlotState::Empty => "-",
        };
        let fragment = slot
            .fragment
            .map(|fragment| fragment.to_string())
            .unwrap_or_default();
        println!(
            "  {marker} [{}] {:<28} {fragment}",
            slot.index,
            slot.url.as_deref().unwrap_or("")
        );
    }
}

async fn run_step(router: &mut Router<HeadlessViewTree>, step: &str) -> Result<String, ViewError> {
    let outcome = match step {
        "back" => router.back().await?,
        "reset" => {
            router.reset();
            return Ok("reset".to_string());
        }
        path => router.show(path).await?,
    };
    Ok(match outcome {
        Some(transition) if transition.restored => {
            format!("restored {} in slot {}", transition.fragment, transition.slot)
        }
        Some(transition) => format!("loaded {} into slot {}", transition.fragment, transition.slot),
        None => "unchanged".to_string(),
    })
}

fn main() -> ExitCode {
    let cli = cli().run();

    let prefs = match &cli.prefs {
        Some(path) => match ShellPrefs::load(path) {
            Ok(prefs) => prefs,
            Err(error) => {
                eprintln!("pageshell: {error}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut prefs = ShellPrefs::default();
            prefs.apply_env_overrides();
            prefs
        }
    };
    init_logging(cli.log.as_deref().or(prefs.log_filter.as_deref()));
    let diagnostics = install_global_channel();

    let registry = Arc::new(ControllerRegistry::with_native_controllers());
    let content: Arc<dyn ContentSource> = match cli.pages.clone().or(prefs.pages_dir.clone()) {
        Some(dir) => {
            info!("serving pages from {}", dir.display());
            Arc::new(DirectoryContentSource::new(dir))
        }
        None => Arc::new(demo_pages()),
    };
    let routes = if prefs.routes.is_empty() {
        demo_routes()
    } else {
        prefs.routes.clone()
    };

    let container = ViewContainer::new(HeadlessViewTree::new(), registry.clone())
        .with_settle_tick(prefs.settle_tick);
    let mut router = Router::new(ViewManager::new(container), registry, content)
        .with_base_url(prefs.base_url.clone());
    router.add_routes(routes);

    let steps: Vec<String> = if cli.steps.is_empty() {
        DEFAULT_STEPS.iter().map(|step| step.to_string()).collect()
    } else {
        cli.steps.clone()
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("pageshell: failed to start runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut failures = 0usize;
    runtime.block_on(async {
        for step in &steps {
            match run_step(&mut router, step).await {
                Ok(summary) => println!("{step}: {summary}"),
                Err(error) => {
                    warn!("{step} failed: {error}");
                    println!("{step}: error: {error}");
                    failures += 1;
                }
            }
            print_slots(&router);
        }
    });

    let mut channel_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for event in diagnostics.try_iter() {
        *channel_counts.entry(event.channel_id()).or_default() += 1;
    }
    for (channel, count) in channel_counts {
        info!("diagnostics: {channel} x{count}");
    }

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

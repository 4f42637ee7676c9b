// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use futures::StreamExt;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use the_orbit::config::{load_and_validate_settings_config, Settings, SettingsConfig};
use the_orbit::container::RealContainer;
use the_orbit::engine::PipelineBuilder;
use the_orbit::errors::ExecutionError;
use the_orbit::testing::TestStreamObserver;
use the_orbit::traits::{Container, ContainerHost};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
struct CounterState {
    id: i32,
}

/// Demo host exposing two intents.
struct CounterHost {
    container: Arc<dyn Container<CounterState, String>>,
}

impl ContainerHost<CounterState, String> for CounterHost {
    fn container(&self) -> &Arc<dyn Container<CounterState, String>> {
        &self.container
    }
}

impl CounterHost {
    /// Add five to `input` off the state lock, then store the result.
    async fn add_five_to(&self, input: i32) -> Result<(), ExecutionError> {
        let pipeline = PipelineBuilder::<CounterState, String, ()>::with_input(input)
            .named("add_five_to")
            .transform(|ctx| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(ctx.event + 5)
            })
            .reduce(|ctx| CounterState { id: *ctx.event })
            .build();
        self.dispatch(pipeline).await
    }

    /// Post one side effect per announced value.
    async fn announce(&self, values: Vec<i32>) -> Result<(), ExecutionError> {
        let pipeline = self
            .intent("announce")
            .transform_many(move |_| futures::stream::iter(values.clone()))
            .post_side_effect(|ctx| ctx.event.to_string())
            .build();
        self.dispatch(pipeline).await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("the_orbit=info".parse()?))
        .init();

    let args: Vec<String> = env::args().collect();
    let cfg = match args.get(1) {
        Some(path) => load_and_validate_settings_config(path)?,
        None => SettingsConfig::default(),
    };

    println!("🛰  The Orbit: MVI container demo");
    println!("═══════════════════════════════════");
    println!("Settings: {:?}", cfg);
    println!();

    run_add_five(&cfg).await?;
    println!();
    run_announce(&cfg).await?;

    println!("\n🎉 Demo complete!");
    Ok(())
}

async fn run_add_five(cfg: &SettingsConfig) -> anyhow::Result<()> {
    println!("Scenario 1: transform then reduce");
    let container: RealContainer<CounterState, String> =
        RealContainer::create(CounterState { id: 0 }, Settings::from_config(cfg));
    let states = TestStreamObserver::spawn(container.observe_state());
    let host = CounterHost {
        container: Arc::new(container.clone()),
    };

    host.add_five_to(10).await?;
    if !states.await_count(2, cfg.assert_timeout()).await {
        anyhow::bail!("state never reached the expected value");
    }

    for (i, state) in states.values().iter().enumerate() {
        println!("  state[{}] = {:?}", i, state);
    }
    container.close();
    Ok(())
}

async fn run_announce(cfg: &SettingsConfig) -> anyhow::Result<()> {
    println!("Scenario 2: transform-many fan-out into side effects");
    let container: RealContainer<CounterState, String> =
        RealContainer::create(CounterState { id: 42 }, Settings::from_config(cfg));
    let host = CounterHost {
        container: Arc::new(container.clone()),
    };

    host.announce(vec![1, 2, 3, 4]).await?;
    let side_effects: Vec<String> = container.observe_side_effects().take(4).collect().await;

    for (i, side_effect) in side_effects.iter().enumerate() {
        println!("  side_effect[{}] = {:?}", i, side_effect);
    }
    println!("  final state = {:?}", container.current_state());
    container.close();
    Ok(())
}

//! `riotquest get <path>...` – batch of requests run through one dispatcher.

use anyhow::{Context, Result};
use riotquest_core::config::RiotQuestConfig;
use riotquest_core::FailureInfo;
use std::cell::RefCell;
use std::rc::Rc;

use crate::cli::settings::Settings;
use crate::cli::RequestOpts;

type PathOutcome = (String, Result<serde_json::Value, FailureInfo>);

fn fetch_all(settings: &Settings, paths: &[String]) -> Result<Vec<PathOutcome>> {
    let slots: Rc<RefCell<Vec<Option<Result<serde_json::Value, FailureInfo>>>>> =
        Rc::new(RefCell::new(vec![None; paths.len()]));
    let mut dispatcher = settings.dispatcher()?;
    for (i, path) in paths.iter().enumerate() {
        let done = Rc::clone(&slots);
        let fail = Rc::clone(&slots);
        dispatcher.add(
            settings.descriptor(path),
            move |value| done.borrow_mut()[i] = Some(Ok(value)),
            Some(Box::new(move |failure: FailureInfo| {
                fail.borrow_mut()[i] = Some(Err(failure))
            })),
        )?;
    }
    dispatcher.exec()?;

    let slots = slots.borrow_mut().drain(..).collect::<Vec<_>>();
    paths
        .iter()
        .cloned()
        .zip(slots)
        .map(|(path, slot)| {
            let outcome = slot.with_context(|| format!("{} settled without an outcome", path))?;
            Ok((path, outcome))
        })
        .collect()
}

pub async fn run_get(cfg: &RiotQuestConfig, paths: &[String], opts: &RequestOpts) -> Result<()> {
    let settings = Settings::resolve(cfg, opts)?;
    let owned = paths.to_vec();
    let outcomes = tokio::task::spawn_blocking(move || fetch_all(&settings, &owned))
        .await
        .context("batch task join")??;

    let mut failed = 0usize;
    for (path, outcome) in &outcomes {
        match outcome {
            Ok(value) => println!("{}\n{}", path, serde_json::to_string_pretty(value)?),
            Err(failure) => {
                failed += 1;
                println!("{}\nerror: {}", path, failure);
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} requests failed", failed, outcomes.len());
    }
    Ok(())
}

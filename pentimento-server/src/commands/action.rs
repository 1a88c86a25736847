//! Applying decoded actions to the registry and view

use pentimento_protocol::{Action, AddLayer, RemoveLayer};
use pentimento_utils::{PentimentoError, Result};
use tracing::{debug, info};

use crate::reconcile;
use crate::state::{Layer, SharedState, Tools};

/// Apply one action
pub async fn apply(action: Action, shared: &SharedState, tools: &Tools) -> Result<()> {
    match action {
        Action::Add(add) => apply_add(add, shared, tools).await,
        Action::Remove(remove) => apply_remove(remove, shared),
        Action::QueryWindows => reconcile::reconcile(shared).map(|_| ()),
    }
}

async fn apply_add(add: AddLayer, shared: &SharedState, tools: &Tools) -> Result<()> {
    // Decode without holding the state lock
    let image = tools.loader.load(&add.path).await?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PentimentoError::geometry(format!(
            "{} has no pixels",
            add.path.display()
        )));
    }

    let draw = add.draw;
    let layer = Layer::new(add, image);
    let identifier = layer.identifier.clone();

    let mut state = shared.state.lock();
    let replaced = state.view.insert(layer);
    info!(identifier = %identifier, replaced, "Layer added");

    if draw {
        state.redraw()?;
    }
    Ok(())
}

fn apply_remove(remove: RemoveLayer, shared: &SharedState) -> Result<()> {
    let mut state = shared.state.lock();
    let Some(_) = state.view.remove(&remove.identifier) else {
        debug!(identifier = %remove.identifier, "Layer not present");
        return Ok(());
    };
    info!(identifier = %remove.identifier, "Layer removed");

    if remove.draw {
        state.redraw()?;
    }
    Ok(())
}

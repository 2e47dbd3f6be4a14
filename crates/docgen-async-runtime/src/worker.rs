use crate::{WizardCommand, WizardUpdate};
use docgen_wizard::{StepId, Wizard};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Async worker task that applies UI commands to the wizard and sends updates
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<WizardCommand>,
    update_tx: mpsc::UnboundedSender<WizardUpdate>,
    wizard: Arc<Wizard>,
) {
    while let Some(cmd) = command_rx.recv().await {
        if !process_command(cmd, &wizard, &mut command_rx, &update_tx).await {
            return;
        }
    }
    // UI went away without an explicit shutdown
    wizard.shutdown().await;
    let _ = update_tx.send(WizardUpdate::Closed);
}

/// Returns `false` once the worker should stop
async fn process_command(
    cmd: WizardCommand,
    wizard: &Wizard,
    command_rx: &mut mpsc::UnboundedReceiver<WizardCommand>,
    update_tx: &mpsc::UnboundedSender<WizardUpdate>,
) -> bool {
    if let WizardCommand::Activate = cmd {
        // Drain queued activations; only the latest step state matters
        while let Ok(next_cmd) = command_rx.try_recv() {
            if let WizardCommand::Activate = next_cmd {
                log::debug!("Discarding queued activation");
            } else if !Box::pin(process_command(next_cmd, wizard, command_rx, update_tx)).await {
                return false;
            }
        }
    }

    let (index_before, error_before) = wizard
        .store()
        .read(|s| (s.current_step_index, s.error.clone()));

    match cmd {
        WizardCommand::SelectTemplate { template } => {
            if !wizard.select_template(template).await {
                let _ = update_tx.send(WizardUpdate::Error {
                    message: format!("Template {} was not selected", template),
                });
            }
        }
        WizardCommand::SelectCustomTemplate { bytes } => {
            if let Err(e) = wizard.select_custom_template(bytes).await {
                let _ = update_tx.send(WizardUpdate::Error {
                    message: format!("Failed to load template: {}", e),
                });
            }
        }
        WizardCommand::EditData { text } => {
            if wizard.edit_data(&text) {
                let _ = update_tx.send(WizardUpdate::DataValid);
            } else {
                send_data_error(wizard, update_tx);
            }
        }
        WizardCommand::Next => {
            if !wizard.next().await {
                send_data_error(wizard, update_tx);
            }
        }
        WizardCommand::Previous => {
            wizard.previous().await;
        }
        WizardCommand::GoTo { index } => {
            wizard.go_to(index).await;
        }
        WizardCommand::Key { input } => {
            wizard.handle_key(input).await;
        }
        WizardCommand::Activate => {
            let step = current_step(wizard);
            let outcome = wizard.activate().await;
            let _ = update_tx.send(WizardUpdate::Initialized { step, outcome });
        }
        WizardCommand::TryAgain => {
            let step = current_step(wizard);
            let outcome = wizard.try_again().await;
            let _ = update_tx.send(WizardUpdate::Initialized { step, outcome });
        }
        WizardCommand::Reset => {
            wizard.reset().await;
        }
        WizardCommand::ExportPdf => match wizard.export_pdf().await {
            Ok(bytes) => {
                let _ = update_tx.send(WizardUpdate::PdfExported { bytes });
            }
            Err(e) => {
                let _ = update_tx.send(WizardUpdate::Error {
                    message: format!("Failed to export PDF: {}", e),
                });
            }
        },
        WizardCommand::Shutdown => {
            wizard.shutdown().await;
            let _ = update_tx.send(WizardUpdate::Closed);
            return false;
        }
    }

    let (index, step, error) = wizard
        .store()
        .read(|s| (s.current_step_index, s.current_step(), s.error.clone()));
    if index != index_before {
        let _ = update_tx.send(WizardUpdate::StepChanged { index, step });
    }
    if let Some(message) = error.filter(|e| Some(e) != error_before.as_ref()) {
        let _ = update_tx.send(WizardUpdate::Error { message });
    }
    true
}

fn current_step(wizard: &Wizard) -> StepId {
    wizard.store().read(|s| s.current_step())
}

fn send_data_error(wizard: &Wizard, update_tx: &mpsc::UnboundedSender<WizardUpdate>) {
    if let Some(message) = wizard.data_validation_error() {
        let _ = update_tx.send(WizardUpdate::DataInvalid { message });
    }
}

use crate::event::PortalEvent;
use crate::model::{Appointment, Language};
use crate::storage::bridge::{APPOINTMENTS_KEY, LANGUAGE_KEY};
use crate::storage::ChangeStream;
use log::warn;
use std::sync::mpsc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub fn spawn_sync_listener(
    handle: &Handle,
    mut changes: ChangeStream,
    tx: mpsc::Sender<PortalEvent>,
) -> JoinHandle<()> {
    handle.spawn(async move {
        while let Some(change) = changes.next().await {
            let Some(new_value) = change.new_value else {
                continue;
            };

            match change.key.as_str() {
                APPOINTMENTS_KEY => {
                    match serde_json::from_str::<Vec<Appointment>>(&new_value) {
                        Ok(appointments) => {
                            if tx
                                .send(PortalEvent::AppointmentsReplaced(appointments))
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(err) => {
                            warn!("ignoring malformed appointment snapshot from another context: {err}");
                        }
                    }
                }
                LANGUAGE_KEY => match Language::from_name(&new_value) {
                    Some(language) => {
                        if tx.send(PortalEvent::LanguageChanged(language)).is_err() {
                            break;
                        }
                    }
                    None => {
                        warn!("ignoring unknown language preference {new_value:?} from another context");
                    }
                },
                _ => {}
            }
        }
    })
}

use crate::model::{Appointment, Language};

#[derive(Debug, Clone)]
pub enum PortalEvent {
    AppointmentsReplaced(Vec<Appointment>),
    LanguageChanged(Language),
}

use crate::event::PortalEvent;
use crate::login;
use crate::model::{
    now_millis, record_id, Appointment, Language, Message, Role, TriageStatus, User,
};
use crate::storage::bridge::StorageBridge;
use crate::storage::StorageError;
use log::warn;
use std::sync::mpsc::{Receiver, TryRecvError};

pub struct Portal {
    bridge: StorageBridge,
    rx: Receiver<PortalEvent>,
    current_user: Option<User>,
    appointments: Vec<Appointment>,
    language: Language,
}

impl Portal {
    pub fn new(bridge: StorageBridge, rx: Receiver<PortalEvent>) -> Result<Self, StorageError> {
        let current_user = bridge.load_session()?;
        let appointments = bridge.load_appointments()?;
        let language = bridge.load_language();

        Ok(Self {
            bridge,
            rx,
            current_user,
            appointments,
            language,
        })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn login(&mut self, user: User) {
        self.bridge.save_session(&user);
        self.current_user = Some(user);
    }

    pub fn logout(&mut self) {
        self.current_user = None;
        self.bridge.clear_session();
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if let Err(err) = self.bridge.save_language(language) {
            warn!("failed to persist language preference: {err}");
        }
    }

    pub fn add_appointment(&mut self, appointment: Appointment) {
        self.appointments.insert(0, appointment);
        self.persist();
    }

    pub fn book_appointment(
        &mut self,
        doctor_id: &str,
        date: &str,
        time: &str,
        symptoms: &str,
    ) -> Option<Appointment> {
        let user = self.current_user.clone()?;
        let doctor_name =
            login::doctor_name(doctor_id).unwrap_or_else(|| "Unknown".to_string());

        let appointment = Appointment {
            id: record_id(),
            patient_id: user.id,
            patient_name: user.name,
            doctor_id: doctor_id.to_string(),
            doctor_name,
            date: date.to_string(),
            time: time.to_string(),
            symptoms: symptoms.to_string(),
            status: TriageStatus::Good,
            created_at: now_millis(),
            messages: Vec::new(),
        };

        self.add_appointment(appointment.clone());
        Some(appointment)
    }

    pub fn update_status(&mut self, appointment_id: &str, status: TriageStatus) {
        if let Some(appointment) = self
            .appointments
            .iter_mut()
            .find(|appt| appt.id == appointment_id)
        {
            appointment.status = status;
        }
        self.persist();
    }

    pub fn send_message(&mut self, appointment_id: &str, text: &str) {
        let Some(user) = &self.current_user else {
            return;
        };

        let message = Message {
            id: record_id(),
            sender_id: user.id.clone(),
            sender_name: user.name.clone(),
            text: text.to_string(),
            timestamp: now_millis(),
        };

        if let Some(appointment) = self
            .appointments
            .iter_mut()
            .find(|appt| appt.id == appointment_id)
        {
            appointment.messages.push(message);
        }
        self.persist();
    }

    pub fn visible_appointments(&self) -> Vec<&Appointment> {
        let Some(user) = &self.current_user else {
            return Vec::new();
        };

        self.appointments
            .iter()
            .filter(|appt| match user.role {
                Role::Patient => appt.patient_id == user.id,
                Role::Doctor => appt.doctor_id == user.id,
            })
            .collect()
    }

    pub fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("sync event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: PortalEvent) {
        match event {
            PortalEvent::AppointmentsReplaced(appointments) => {
                self.appointments = appointments;
            }
            PortalEvent::LanguageChanged(language) => {
                self.language = language;
            }
        }
    }

    fn persist(&self) {
        if let Err(err) = self.bridge.save_appointments(&self.appointments) {
            warn!("failed to persist appointments: {err}");
        }
    }
}

use candid::{CandidType, Deserialize, Principal};

use crate::error::PresaleError;

/// Who may call an operation, checked once at entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    DuringSale,
    Guildmaster,
    Gatekeeper,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Denial {
    NotGuildmaster,
    NotGatekeeper,
    GatekeeperUnset,
    SaleClosed { now: u64, start: u64, end: u64 },
}

impl From<Denial> for PresaleError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotGuildmaster => PresaleError::Unauthorized("guildmaster only".to_string()),
            Denial::NotGatekeeper => PresaleError::Unauthorized("gatekeeper only".to_string()),
            Denial::GatekeeperUnset => PresaleError::Unauthorized("gatekeeper has not been set".to_string()),
            Denial::SaleClosed { now, start, end } => PresaleError::WindowError(format!(
                "sale runs from {} until {}, now is {}",
                start, end, now
            )),
        }
    }
}

/// Role identities and the sale window.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccessController {
    guildmaster: Principal,
    gatekeeper: Option<Principal>,
    sale_start: u64,
    sale_duration: u64,
}

impl AccessController {
    pub fn new(guildmaster: Principal, sale_start: u64, sale_duration: u64) -> Self {
        Self {
            guildmaster,
            gatekeeper: None,
            sale_start,
            sale_duration,
        }
    }

    pub fn authorize(&self, gate: Gate, caller: Principal, now: u64) -> Result<(), Denial> {
        match gate {
            Gate::DuringSale if self.is_during_sale(now) => Ok(()),
            Gate::DuringSale => Err(Denial::SaleClosed {
                now,
                start: self.sale_start,
                end: self.sale_end(),
            }),
            Gate::Guildmaster if caller == self.guildmaster => Ok(()),
            Gate::Guildmaster => Err(Denial::NotGuildmaster),
            Gate::Gatekeeper => match self.gatekeeper {
                None => Err(Denial::GatekeeperUnset),
                Some(gatekeeper) if gatekeeper == caller => Ok(()),
                Some(_) => Err(Denial::NotGatekeeper),
            },
        }
    }

    /// `sale_start <= now < sale_start + sale_duration`
    pub fn is_during_sale(&self, now: u64) -> bool {
        self.sale_start <= now && now < self.sale_end()
    }

    pub fn sale_end(&self) -> u64 {
        self.sale_start.saturating_add(self.sale_duration)
    }

    /// One-shot: only from unset, only to a real identity.
    pub(crate) fn assign_gatekeeper(&mut self, gatekeeper: Principal) -> Result<(), PresaleError> {
        if gatekeeper == Principal::anonymous() {
            return Err(PresaleError::Validation("Gatekeeper cannot be the anonymous principal".to_string()));
        }
        if let Some(current) = self.gatekeeper {
            return Err(PresaleError::Validation(format!("Gatekeeper already set to {}", current)));
        }
        self.gatekeeper = Some(gatekeeper);
        Ok(())
    }

    /// Moves the start strictly later, and only before the sale has begun.
    /// Returns the previous start.
    pub(crate) fn postpone(&mut self, now: u64, new_start: u64) -> Result<u64, PresaleError> {
        if now >= self.sale_start {
            return Err(PresaleError::WindowError(format!(
                "sale already started at {}",
                self.sale_start
            )));
        }
        if new_start <= self.sale_start {
            return Err(PresaleError::WindowError(format!(
                "new start {} is not after current start {}",
                new_start, self.sale_start
            )));
        }
        Ok(std::mem::replace(&mut self.sale_start, new_start))
    }

    pub fn guildmaster(&self) -> Principal {
        self.guildmaster
    }

    pub fn gatekeeper(&self) -> Option<Principal> {
        self.gatekeeper
    }

    pub fn sale_start(&self) -> u64 {
        self.sale_start
    }

    pub fn sale_duration(&self) -> u64 {
        self.sale_duration
    }
}

//! Record store interface and an in-memory implementation.

use crate::core::{
    Accountant, Client, ClientTouch, Employee, NewAccountant, NewClient, NewEmployee,
    NewObligation, Obligation, StoreError,
};

/// Persistence for clients, accountants, employees and obligations.
///
/// Calls are blocking and fire-once; nothing here retries or spans a
/// transaction across calls.
pub trait RecordStore {
    /// Look a client up by CNPJ.
    fn find_client_by_cnpj(&self, cnpj: &str) -> Result<Option<Client>, StoreError>;

    /// Create a client. Fails with [`StoreError::Duplicate`] if the CNPJ is taken.
    fn create_client(&mut self, client: NewClient) -> Result<Client, StoreError>;

    fn list_clients(&self) -> Result<Vec<Client>, StoreError>;

    /// Create an accountant. The CPF/CNPJ must be unique.
    fn create_accountant(&mut self, accountant: NewAccountant) -> Result<Accountant, StoreError>;

    fn list_accountants(&self) -> Result<Vec<Accountant>, StoreError>;

    /// Create an employee. The CPF, when given, must be unique.
    fn create_employee(&mut self, employee: NewEmployee) -> Result<Employee, StoreError>;

    fn list_employees(&self) -> Result<Vec<Employee>, StoreError>;

    /// Persist an obligation for an existing client.
    fn create_obligation(&mut self, obligation: NewObligation) -> Result<Obligation, StoreError>;

    fn list_obligations(&self) -> Result<Vec<Obligation>, StoreError>;

    /// Obligations owned by one client.
    fn obligations_for_client(&self, client_id: u64) -> Result<Vec<Obligation>, StoreError> {
        Ok(self
            .list_obligations()?
            .into_iter()
            .filter(|o| o.client_id == client_id)
            .collect())
    }
}

/// Make sure a client exists for `touch`, creating it with only CNPJ and
/// name when absent. An existing client is returned untouched.
pub fn ensure_client<S: RecordStore + ?Sized>(
    store: &mut S,
    touch: &ClientTouch,
) -> Result<Client, StoreError> {
    if let Some(existing) = store.find_client_by_cnpj(&touch.tax_id)? {
        return Ok(existing);
    }
    let created = store.create_client(NewClient::new(&touch.tax_id, &touch.name))?;
    tracing::info!(cnpj = %created.cnpj, name = %created.legal_name, "client created from invoice");
    Ok(created)
}

/// Vec-backed [`RecordStore`] with sequential ids starting at 1.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    clients: Vec<Client>,
    accountants: Vec<Accountant>,
    employees: Vec<Employee>,
    obligations: Vec<Obligation>,
    last_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

impl RecordStore for MemoryStore {
    fn find_client_by_cnpj(&self, cnpj: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.iter().find(|c| c.cnpj == cnpj).cloned())
    }

    fn create_client(&mut self, client: NewClient) -> Result<Client, StoreError> {
        if self.clients.iter().any(|c| c.cnpj == client.cnpj) {
            return Err(StoreError::Duplicate {
                entity: "client",
                key: client.cnpj,
            });
        }
        let created = Client {
            id: self.next_id(),
            legal_name: client.legal_name,
            cnpj: client.cnpj,
            email: client.email,
            whatsapp: client.whatsapp,
        };
        self.clients.push(created.clone());
        Ok(created)
    }

    fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        Ok(self.clients.clone())
    }

    fn create_accountant(&mut self, accountant: NewAccountant) -> Result<Accountant, StoreError> {
        if self.accountants.iter().any(|a| a.tax_id == accountant.tax_id) {
            return Err(StoreError::Duplicate {
                entity: "accountant",
                key: accountant.tax_id,
            });
        }
        let created = Accountant {
            id: self.next_id(),
            kind: accountant.kind,
            tax_id: accountant.tax_id,
            name: accountant.name,
            crc: accountant.crc,
            whatsapp: accountant.whatsapp,
            email: accountant.email,
        };
        self.accountants.push(created.clone());
        Ok(created)
    }

    fn list_accountants(&self) -> Result<Vec<Accountant>, StoreError> {
        Ok(self.accountants.clone())
    }

    fn create_employee(&mut self, employee: NewEmployee) -> Result<Employee, StoreError> {
        if let Some(cpf) = employee.cpf.as_deref() {
            if self.employees.iter().any(|e| e.cpf.as_deref() == Some(cpf)) {
                return Err(StoreError::Duplicate {
                    entity: "employee",
                    key: cpf.to_string(),
                });
            }
        }
        let created = Employee {
            id: self.next_id(),
            name: employee.name,
            cpf: employee.cpf,
            whatsapp: employee.whatsapp,
        };
        self.employees.push(created.clone());
        Ok(created)
    }

    fn list_employees(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(self.employees.clone())
    }

    fn create_obligation(&mut self, obligation: NewObligation) -> Result<Obligation, StoreError> {
        if !self.clients.iter().any(|c| c.id == obligation.client_id) {
            return Err(StoreError::NotFound {
                entity: "client",
                id: obligation.client_id,
            });
        }
        let created = Obligation {
            id: self.next_id(),
            client_id: obligation.client_id,
            description: obligation.description,
            due_date: obligation.due_date,
            amount: obligation.amount,
            status: obligation.status,
        };
        self.obligations.push(created.clone());
        Ok(created)
    }

    fn list_obligations(&self) -> Result<Vec<Obligation>, StoreError> {
        Ok(self.obligations.clone())
    }
}

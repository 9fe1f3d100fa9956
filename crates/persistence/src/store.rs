// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The association store contract.

use company_assoc_domain::{Association, AssociationStatus, Page, PageRequest};

use crate::error::PersistenceError;
use crate::{BackendConnection, Persistence, mutations, queries};

/// Storage for association records.
///
/// Writes go through `insert_or_update` and `write_all` only. Callers pass the version they
/// read; a write computed from a stale read fails with
/// `PersistenceError::VersionConflict` and must be recomputed.
pub trait AssociationStore {
    /// Retrieves an association by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_by_id(&mut self, association_id: &str) -> Result<Option<Association>, PersistenceError>;

    /// Retrieves the association linking a company to a user id or email.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_by_company_and_user(
        &mut self,
        company_number: &str,
        user_id: Option<&str>,
        user_email: Option<&str>,
    ) -> Result<Option<Association>, PersistenceError>;

    /// Lists a company's associations with one of `statuses`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list_by_company(
        &mut self,
        company_number: &str,
        statuses: &[AssociationStatus],
        page: PageRequest,
    ) -> Result<Page<Association>, PersistenceError>;

    /// Lists a user's associations with one of `statuses`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list_by_user(
        &mut self,
        user_id: Option<&str>,
        user_email: Option<&str>,
        statuses: &[AssociationStatus],
        company_prefix: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Association>, PersistenceError>;

    /// Lists up to `limit` associations with `status` whose id sorts after `after_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list_by_status_after(
        &mut self,
        status: AssociationStatus,
        after_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Association>, PersistenceError>;

    /// Inserts (`expected_version` of `None`) or updates an association.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` on an insert collision, `VersionConflict` when
    /// the stored version moved on, or a database error.
    fn insert_or_update(
        &mut self,
        association: &Association,
        expected_version: Option<i64>,
    ) -> Result<Association, PersistenceError> {
        self.write_all(&[(association, expected_version)])?
            .pop()
            .ok_or_else(|| {
                PersistenceError::QueryFailed(format!(
                    "No record returned for association '{}'",
                    association.id
                ))
            })
    }

    /// Applies several inserts or updates atomically, as `insert_or_update`
    /// would apply each of them.
    ///
    /// # Errors
    ///
    /// Returns the first failing write's error; nothing is written then.
    fn write_all(
        &mut self,
        writes: &[(&Association, Option<i64>)],
    ) -> Result<Vec<Association>, PersistenceError>;
}

impl AssociationStore for Persistence {
    fn find_by_id(&mut self, association_id: &str) -> Result<Option<Association>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::find_by_id_sqlite(conn, association_id),
            #[cfg(feature = "mysql")]
            BackendConnection::Mysql(conn) => queries::find_by_id_mysql(conn, association_id),
        }
    }

    fn find_by_company_and_user(
        &mut self,
        company_number: &str,
        user_id: Option<&str>,
        user_email: Option<&str>,
    ) -> Result<Option<Association>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                queries::find_by_company_and_user_sqlite(conn, company_number, user_id, user_email)
            }
            #[cfg(feature = "mysql")]
            BackendConnection::Mysql(conn) => {
                queries::find_by_company_and_user_mysql(conn, company_number, user_id, user_email)
            }
        }
    }

    fn list_by_company(
        &mut self,
        company_number: &str,
        statuses: &[AssociationStatus],
        page: PageRequest,
    ) -> Result<Page<Association>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                queries::list_by_company_sqlite(conn, company_number, statuses, page)
            }
            #[cfg(feature = "mysql")]
            BackendConnection::Mysql(conn) => {
                queries::list_by_company_mysql(conn, company_number, statuses, page)
            }
        }
    }

    fn list_by_user(
        &mut self,
        user_id: Option<&str>,
        user_email: Option<&str>,
        statuses: &[AssociationStatus],
        company_prefix: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Association>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::list_by_user_sqlite(
                conn,
                user_id,
                user_email,
                statuses,
                company_prefix,
                page,
            ),
            #[cfg(feature = "mysql")]
            BackendConnection::Mysql(conn) => queries::list_by_user_mysql(
                conn,
                user_id,
                user_email,
                statuses,
                company_prefix,
                page,
            ),
        }
    }

    fn list_by_status_after(
        &mut self,
        status: AssociationStatus,
        after_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Association>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                queries::list_by_status_after_sqlite(conn, status, after_id, limit)
            }
            #[cfg(feature = "mysql")]
            BackendConnection::Mysql(conn) => {
                queries::list_by_status_after_mysql(conn, status, after_id, limit)
            }
        }
    }

    fn write_all(
        &mut self,
        writes: &[(&Association, Option<i64>)],
    ) -> Result<Vec<Association>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => mutations::write_associations_sqlite(conn, writes),
            #[cfg(feature = "mysql")]
            BackendConnection::Mysql(conn) => mutations::write_associations_mysql(conn, writes),
        }
    }
}

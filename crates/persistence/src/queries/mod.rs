// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic read queries.

pub mod associations;

pub use associations::{
    find_by_company_and_user_sqlite, find_by_id_sqlite, list_by_company_sqlite,
    list_by_status_after_sqlite, list_by_user_sqlite,
};

#[cfg(feature = "mysql")]
pub use associations::{
    find_by_company_and_user_mysql, find_by_id_mysql, list_by_company_mysql,
    list_by_status_after_mysql, list_by_user_mysql,
};

#![allow(dead_code)]

use serde_json::json;
use std::path::Path;

/// The demo marketplace shared by the integration tests: three clients, three
/// contractors, four contracts, five open jobs and three settled ones.
///
/// Outstanding obligations: client 1 owes 503 (jobs 1, 2 and 3 — job 3 sits
/// on a terminated contract and still counts), client 2 owes 200, client 4
/// owes 200.1.
pub fn demo_seed() -> serde_json::Value {
    json!({
        "profiles": [
            {"id": 1, "kind": "client", "first_name": "Harry", "last_name": "Potter",
             "profession": "wizard", "balance": 1150},
            {"id": 2, "kind": "client", "first_name": "Mr", "last_name": "Robot",
             "profession": "hacker", "balance": 231.11},
            {"id": 4, "kind": "client", "first_name": "Ash", "last_name": "Kethcum",
             "profession": "pokemon master", "balance": 1.3},
            {"id": 5, "kind": "contractor", "first_name": "John", "last_name": "Lenon",
             "profession": "Musician", "balance": 64},
            {"id": 6, "kind": "contractor", "first_name": "Linus", "last_name": "Torvalds",
             "profession": "Programmer", "balance": 1214},
            {"id": 7, "kind": "contractor", "first_name": "Alan", "last_name": "Turing",
             "profession": "Programmer", "balance": 22}
        ],
        "contracts": [
            {"id": 1, "client_id": 1, "contractor_id": 5, "status": "terminated", "terms": "bla bla bla"},
            {"id": 2, "client_id": 1, "contractor_id": 6, "status": "in_progress", "terms": "bla bla bla"},
            {"id": 3, "client_id": 2, "contractor_id": 6, "status": "in_progress", "terms": "bla bla bla"},
            {"id": 4, "client_id": 4, "contractor_id": 7, "status": "in_progress", "terms": "bla bla bla"}
        ],
        "jobs": [
            {"id": 1, "contract_id": 2, "description": "work", "price": 200},
            {"id": 2, "contract_id": 2, "description": "work", "price": 201},
            {"id": 3, "contract_id": 1, "description": "work", "price": 102},
            {"id": 4, "contract_id": 3, "description": "work", "price": 200},
            {"id": 5, "contract_id": 4, "description": "work", "price": 200.1},
            {"id": 6, "contract_id": 1, "description": "work", "price": 121,
             "paid_on": "2020-08-10T10:00:00Z"},
            {"id": 7, "contract_id": 2, "description": "work", "price": 21.11,
             "paid_on": "2020-08-15T12:00:00Z"},
            {"id": 8, "contract_id": 3, "description": "work", "price": 21.11,
             "paid_on": "2020-08-15T12:00:00Z"}
        ]
    })
}

pub fn write_demo_seed(path: &Path) {
    std::fs::write(path, serde_json::to_vec_pretty(&demo_seed()).unwrap()).unwrap();
}

pub mod firestore_api;

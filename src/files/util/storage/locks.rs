use std::{collections::HashMap, sync::Arc, sync::Mutex as StdMutex};

use tokio::sync::Mutex;

lazy_static! {
    static ref FILE_LOCKS: StdMutex<HashMap<String, Arc<Mutex<()>>>> =
        StdMutex::new(HashMap::new());
}

// commits and deletes for one id serialize here; different ids run in parallel
pub fn lock_for_id(id: &str) -> Arc<Mutex<()>> {
    let mut locks = FILE_LOCKS.lock().unwrap();

    locks
        .entry(id.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

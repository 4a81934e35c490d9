use protonats::{ServerError, new_server_error};

const TASKS: usize = 64;

fn assert_send_sync<T: Send + Sync + 'static>() {}

#[test]
fn test_server_error_is_send_and_sync() {
    assert_send_sync::<ServerError>();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independently_constructed_errors_do_not_share_headers() {
    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            tokio::spawn(async move {
                let err = new_server_error("SAME", "same description")
                    .add_header_value("Task", i.to_string())
                    .add_header_value("Task", format!("{i}-again"));
                tokio::task::yield_now().await;
                (i, err)
            })
        })
        .collect();

    for handle in handles {
        let (i, err) = handle.await.unwrap();

        assert_eq!(err.headers().len(), 1);
        assert_eq!(
            err.header_values("Task"),
            [i.to_string(), format!("{i}-again")]
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clones_of_a_shared_base_stay_isolated() {
    let base = new_server_error("BASE", "shared base").add_header_value("Base", "yes");

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let base = base.clone();
            tokio::spawn(async move {
                let err = if i % 2 == 0 {
                    base.add_header_value("Base", i.to_string())
                } else {
                    base.set_header_value("Base", i.to_string())
                };
                (i, err.add_header_value("Own", i.to_string()))
            })
        })
        .collect();

    for handle in handles {
        let (i, err) = handle.await.unwrap();

        let expected_base = if i % 2 == 0 {
            vec!["yes".to_string(), i.to_string()]
        } else {
            vec![i.to_string()]
        };
        assert_eq!(err.header_values("Base"), expected_base.as_slice());
        assert_eq!(err.header_values("Own"), [i.to_string()]);
    }

    assert_eq!(base.header_values("Base"), ["yes"]);
    assert!(base.header_values("Own").is_empty());
}

#[test]
fn test_end_to_end_wrapped_storage_failure() {
    let err = ServerError::wrap("disk full", "STORAGE_FULL", "cannot persist record");

    assert_eq!(err.code(), "STORAGE_FULL");
    assert_eq!(err.text(), "cannot persist record: disk full");

    let body = err.wrapped_bytes().unwrap();
    assert_eq!(std::str::from_utf8(&body).unwrap(), "disk full");
}

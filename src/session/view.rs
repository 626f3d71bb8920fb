use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::reconciler::{SessionReconciler, Visibility};

/// 一个已挂载的界面组件对会话状态的视图
///
/// 挂载时启动 bootstrap，结果只在仍处于挂载状态时才写回；
/// bootstrap 本身不会被取消。
pub struct SessionView {
    reconciler: Arc<SessionReconciler>,
    mounted: Arc<AtomicBool>,
    flag: Arc<watch::Sender<bool>>,
    listener: JoinHandle<()>,
}

impl SessionView {
    pub fn mount(reconciler: Arc<SessionReconciler>) -> Self {
        let mounted = Arc::new(AtomicBool::new(true));
        // 首次渲染直接读缓存，bootstrap 返回后再校正
        let (flag, _) = watch::channel(reconciler.sync());
        let flag = Arc::new(flag);

        {
            let reconciler = reconciler.clone();
            let mounted = mounted.clone();
            let flag = flag.clone();
            tokio::spawn(async move {
                reconciler.bootstrap().await;
                if mounted.load(Ordering::Acquire) {
                    flag.send_replace(reconciler.is_authenticated());
                } else {
                    debug!("View unmounted before bootstrap finished");
                }
            });
        }

        let mut events = reconciler.subscribe();
        let listener = {
            let reconciler = reconciler.clone();
            let mounted = mounted.clone();
            let flag = flag.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            if !mounted.load(Ordering::Acquire) {
                                break;
                            }
                            flag.send_replace(reconciler.sync());
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            })
        };

        Self {
            reconciler,
            mounted,
            flag,
            listener,
        }
    }

    /// 挂载时取自缓存，bootstrap 完成后再校正
    pub fn is_authenticated(&self) -> bool {
        *self.flag.borrow()
    }

    pub fn changes(&self) -> watch::Receiver<bool> {
        self.flag.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn reconciler(&self) -> &Arc<SessionReconciler> {
        &self.reconciler
    }

    pub fn on_visibility_change(&self, visibility: Visibility) {
        if let Some(authenticated) = self.reconciler.on_visibility_change(visibility) {
            self.flag.send_replace(authenticated);
        }
    }

    pub fn unmount(self) {}
}

impl Drop for SessionView {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::Release);
        self.listener.abort();
    }
}

//! 对象缓存
//!
//! 后端以插件形式注册（`moka` 内存缓存、`redis`），启动时按 `cache.type` 选择。

pub mod object_cache;
pub mod register;
mod traits;

pub use traits::{CacheResult, ObjectCache};

/// 声明一个缓存插件，生成 `register()` 将构造器登记到注册表
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ty) => {
        pub fn register() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    let fut: $crate::cache::register::BoxedObjectCacheFuture = Box::pin(async {
                        let cache = <$ty>::new()
                            .map_err($crate::errors::ClassroomError::cache_connection)?;
                        Ok::<Box<dyn $crate::cache::ObjectCache>, $crate::errors::ClassroomError>(
                            Box::new(cache),
                        )
                    });
                    fut
                }),
            );
        }
    };
}

/// 注册内置缓存插件
pub fn register_builtin_plugins() {
    object_cache::moka::register();
    object_cache::redis::register();
}

/// 用户对象缓存 key
pub fn user_cache_key(user_id: i64) -> String {
    format!("user:{user_id}")
}

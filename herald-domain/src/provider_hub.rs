//! 服务定位器（ProviderHub）
//!
//! 以 `TypeId` 为键保存共享单例（`Arc<T>`，`T` 可为 trait 对象），
//! 在启动期集中注册，运行期只读解析：
//! - 监听器在 `handle` 中经由 hub 获取仓储、日志等协作者；
//! - 工厂在装配时经由 hub 获取配置与上游依赖。
//!
use crate::error::{DomainError, DomainResult};
use dashmap::DashMap;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

struct Entry {
    name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct ProviderHub {
    providers: DashMap<TypeId, Entry>,
}

impl std::fmt::Debug for ProviderHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHub").finish_non_exhaustive()
    }
}

impl ProviderHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册共享实例；同一类型重复注册时后者覆盖前者
    pub fn register<T>(&self, provider: Arc<T>) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.providers.insert(
            TypeId::of::<T>(),
            Entry {
                name: type_name::<T>(),
                value: Box::new(provider.clone()),
            },
        );
        provider
    }

    /// 解析已注册实例，不存在时返回 `ProviderNotFound`
    pub fn get<T>(&self) -> DomainResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_get::<T>().ok_or(DomainError::ProviderNotFound {
            provider: type_name::<T>(),
        })
    }

    pub fn try_get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let entry = self.providers.get(&TypeId::of::<T>())?;
        entry.value.downcast_ref::<Arc<T>>().cloned()
    }

    pub fn exists<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.providers.contains_key(&TypeId::of::<T>())
    }

    /// 已注册类型名（按名称排序）
    pub fn registered(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.providers.iter().map(|e| e.value().name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

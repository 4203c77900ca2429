//! Fixed-size pool of independently loaded compilers.
//!
//! A [`Compiler`] serves one caller at a time. The pool holds N of them,
//! each with its own engine, plus a free list of slot indices. Checking out
//! pops an index (blocking on a condition variable while the list is
//! empty); dropping the [`PooledCompiler`] guard pushes it back. A member
//! whose recovery left it unavailable gets a fresh engine before it returns
//! to the free list.
//!
//! ```text
//! slots: [ Mutex<Compiler> ; N ]
//! free : Mutex<Vec<usize>>  ──pop──► PooledCompiler ──drop──► push + notify
//! ```

use crate::engine::{EngineHandle, EngineOptions};
use crate::error::{LoadError, PoolError};
use crate::loader::Compiler;
use crate::embedded;
use parking_lot::{Condvar, Mutex, MutexGuard};
use quill_types::{CompileError, CompileOptions, CompileRequest, DomResult, SsrResult, Target};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

/// Arena of compilers shared between threads.
pub struct CompilerPool {
    slots: Vec<Mutex<Compiler>>,
    free: Mutex<Vec<usize>>,
    /// Signalled whenever a slot index is returned.
    available: Condvar,
}

impl fmt::Debug for CompilerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerPool")
            .field("size", &self.size())
            .field("idle", &self.idle())
            .finish()
    }
}

impl CompilerPool {
    /// Builds a pool of `size` compilers, calling `factory` with each slot
    /// index.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Empty`] for `size == 0` and
    /// [`PoolError::Member`] for the first member that fails to load.
    pub fn new<F>(size: usize, mut factory: F) -> Result<Self, PoolError>
    where
        F: FnMut(usize) -> Result<Compiler, LoadError>,
    {
        if size == 0 {
            return Err(PoolError::Empty);
        }

        let mut slots = Vec::with_capacity(size);
        for index in 0..size {
            let compiler = factory(index).map_err(|source| PoolError::Member { index, source })?;
            slots.push(Mutex::new(compiler));
        }

        // Reversed so the first checkout gets slot 0.
        let free = (0..size).rev().collect();
        tracing::debug!(size, "Compiler pool ready");

        Ok(Self {
            slots,
            free: Mutex::new(free),
            available: Condvar::new(),
        })
    }

    /// Builds a pool where every member loads `program` into a fresh engine.
    ///
    /// # Errors
    ///
    /// See [`CompilerPool::new`].
    pub fn with_program(
        size: usize,
        engine_options: &EngineOptions,
        program: &str,
    ) -> Result<Self, PoolError> {
        Self::new(size, |_| {
            let engine = EngineHandle::start(engine_options.clone())?;
            Compiler::load(engine, program)
        })
    }

    /// Builds a pool of compilers running the bundled program.
    ///
    /// # Errors
    ///
    /// See [`CompilerPool::new`].
    pub fn bundled(size: usize) -> Result<Self, PoolError> {
        Self::with_program(size, &EngineOptions::default(), embedded::COMPILER)
    }

    /// Sets the compile options of every member.
    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        for slot in &mut self.slots {
            slot.get_mut().set_options(options);
        }
        self
    }

    /// Number of members.
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of members not currently checked out.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Takes a member, blocking until one is free.
    pub fn checkout(&self) -> PooledCompiler<'_> {
        let mut free = self.free.lock();
        let index = loop {
            if let Some(index) = free.pop() {
                break index;
            }
            self.available.wait(&mut free);
        };
        drop(free);
        self.guard(index)
    }

    /// Takes a member if one is free right now.
    pub fn try_checkout(&self) -> Option<PooledCompiler<'_>> {
        let index = self.free.lock().pop()?;
        Some(self.guard(index))
    }

    /// Takes a member, waiting at most `timeout` in total.
    pub fn checkout_timeout(&self, timeout: Duration) -> Option<PooledCompiler<'_>> {
        let deadline = Instant::now() + timeout;
        let mut free = self.free.lock();
        let index = loop {
            if let Some(index) = free.pop() {
                break index;
            }
            if self.available.wait_until(&mut free, deadline).timed_out() {
                break free.pop()?;
            }
        };
        drop(free);
        Some(self.guard(index))
    }

    fn guard(&self, index: usize) -> PooledCompiler<'_> {
        tracing::trace!(index, "Compiler checked out");
        PooledCompiler {
            pool: self,
            index,
            compiler: self.slots[index].lock(),
        }
    }

    fn release(&self, index: usize) {
        self.free.lock().push(index);
        self.available.notify_one();
        tracing::trace!(index, "Compiler returned");
    }

    /// Compiles on any free member. Blocks while all members are busy.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile_ssr`].
    pub fn compile_ssr(&self, request: &CompileRequest) -> Result<SsrResult, CompileError> {
        self.checkout().compile_ssr(request)
    }

    /// Compiles on any free member. Blocks while all members are busy.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile_dom`].
    pub fn compile_dom(&self, request: &CompileRequest) -> Result<DomResult, CompileError> {
        self.checkout().compile_dom(request)
    }

    /// Compiles for `target` on any free member.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`].
    pub fn compile(&self, target: Target, request: &CompileRequest) -> Result<String, CompileError> {
        self.checkout().compile(target, request)
    }
}

/// Exclusive access to one pool member; returns it on drop.
pub struct PooledCompiler<'a> {
    pool: &'a CompilerPool,
    index: usize,
    compiler: MutexGuard<'a, Compiler>,
}

impl PooledCompiler<'_> {
    /// Slot index of this member.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Deref for PooledCompiler<'_> {
    type Target = Compiler;

    fn deref(&self) -> &Compiler {
        &self.compiler
    }
}

impl DerefMut for PooledCompiler<'_> {
    fn deref_mut(&mut self) -> &mut Compiler {
        &mut self.compiler
    }
}

impl Drop for PooledCompiler<'_> {
    fn drop(&mut self) {
        if !self.compiler.is_available() {
            if let Err(e) = self.compiler.restart() {
                tracing::error!(index = self.index, error = %e, "Pool member still unavailable");
            }
        }
        // The slot lock is released right after this, when `compiler` drops.
        self.pool.release(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn request(source: &str) -> CompileRequest {
        CompileRequest::new("Pool.quill", source)
    }

    #[test]
    fn empty_pool_rejected() {
        let err = CompilerPool::bundled(0).expect_err("should fail");
        assert!(matches!(err, PoolError::Empty));
    }

    #[test]
    fn member_failure_reports_index() {
        let err = CompilerPool::new(3, |index| {
            let engine = EngineHandle::start(EngineOptions::default())?;
            if index == 1 {
                Compiler::load(engine, "")
            } else {
                Compiler::bundled(engine)
            }
        })
        .expect_err("should fail");
        match err {
            PoolError::Member { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(source, LoadError::EmptyProgram));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn checkout_and_return() {
        let pool = CompilerPool::bundled(2).expect("pool");
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.idle(), 2);

        let first = pool.checkout();
        assert_eq!(first.index(), 0);
        let second = pool.try_checkout().expect("second member free");
        assert_eq!(pool.idle(), 0);
        assert!(pool.try_checkout().is_none());

        drop(first);
        assert_eq!(pool.idle(), 1);
        drop(second);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn checkout_timeout_expires_when_busy() {
        let pool = CompilerPool::bundled(1).expect("pool");
        let _held = pool.checkout();
        assert!(pool.checkout_timeout(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn checkout_timeout_bounds_total_wait() {
        let pool = CompilerPool::bundled(1).expect("pool");
        let held = pool.checkout();
        let stop = AtomicBool::new(false);

        thread::scope(|scope| {
            // Wake the waiter repeatedly without ever freeing a slot.
            scope.spawn(|| {
                while !stop.load(Ordering::SeqCst) {
                    pool.available.notify_all();
                    thread::sleep(Duration::from_millis(5));
                }
            });

            let started = Instant::now();
            assert!(pool.checkout_timeout(Duration::from_millis(100)).is_none());
            let waited = started.elapsed();
            stop.store(true, Ordering::SeqCst);
            assert!(waited < Duration::from_millis(1000), "waited {waited:?}");
        });
        drop(held);
    }

    #[test]
    fn unavailable_member_is_restarted_on_return() {
        let pool = CompilerPool::bundled(1).expect("pool");
        {
            let mut member = pool.checkout();
            member.unavailable = Some("rebuild failed".into());
            assert!(!member.is_available());
        }

        let mut member = pool.checkout();
        assert!(member.is_available());
        let result = member.compile_ssr(&request("<p>back</p>")).expect("should compile");
        assert!(result.code.contains("<p>back</p>"));
    }

    #[test]
    fn checkout_blocks_until_release() {
        let pool = Arc::new(CompilerPool::bundled(1).expect("pool"));
        let released = Arc::new(AtomicBool::new(false));
        let held = pool.checkout();

        let waiter = {
            let pool = Arc::clone(&pool);
            let released = Arc::clone(&released);
            thread::spawn(move || {
                let mut compiler = pool.checkout();
                assert!(released.load(Ordering::SeqCst), "checkout returned before release");
                let result = compiler
                    .compile_ssr(&request("<p>late</p>"))
                    .expect("should compile");
                result
            })
        };

        thread::sleep(Duration::from_millis(50));
        released.store(true, Ordering::SeqCst);
        drop(held);

        let result = waiter.join().expect("waiter thread");
        assert!(result.code.contains("<p>late</p>"));
    }

    #[test]
    fn concurrent_compiles_share_members() {
        let pool = CompilerPool::bundled(3).expect("pool");
        let expected = pool
            .compile_dom(&request("<h1>hi world!</h1>"))
            .expect("should compile")
            .code;

        thread::scope(|scope| {
            for worker in 0..8 {
                let pool = &pool;
                let expected = &expected;
                scope.spawn(move || {
                    for i in 0..10 {
                        if (worker + i) % 3 == 0 {
                            let err = pool
                                .compile_dom(&request("<h1>hi world!</h1></h1>"))
                                .expect_err("should fail");
                            assert_eq!(err.kind.as_deref(), Some("invalid-closing-tag"));
                        } else {
                            let result = pool
                                .compile_dom(&request("<h1>hi world!</h1>"))
                                .expect("should compile");
                            assert_eq!(&result.code, expected);
                        }
                    }
                });
            }
        });

        assert_eq!(pool.idle(), 3);
    }

    #[test]
    fn options_apply_to_every_member() {
        let pool = CompilerPool::bundled(2)
            .expect("pool")
            .with_options(CompileOptions::dev());
        let a = pool.checkout();
        let b = pool.checkout();
        assert!(a.options().dev);
        assert!(b.options().dev);
    }
}

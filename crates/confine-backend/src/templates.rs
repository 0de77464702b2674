//! Built-in baseline templates, used when the configuration supplies none.
//!
//! Seccomp profiles are a syscall allow-list, one name per line, with `#`
//! comments. AppArmor profiles wrap the collected snippets in a profile block
//! through the `###VAR###`, `###PROFILEATTACH###`, `###FLAGS###` and
//! `###SNIPPETS###` placeholders.

/// Baseline syscalls every strictly confined app may use.
pub const SECCOMP_DEFAULT: &str = "\
# Baseline syscalls for confined applications
access
arch_prctl
brk
capget
chdir
clock_getres
clock_gettime
clock_nanosleep
clone
close
dup
dup2
dup3
epoll_create
epoll_create1
epoll_ctl
epoll_pwait
epoll_wait
eventfd
eventfd2
execve
exit
exit_group
faccessat
fadvise64
fcntl
fdatasync
flock
fstat
fstatfs
fsync
ftruncate
futex
getcwd
getdents
getdents64
getegid
geteuid
getgid
getgroups
getpid
getppid
getpriority
getrandom
getresgid
getresuid
getrlimit
getrusage
gettid
gettimeofday
getuid
inotify_add_watch
inotify_init
inotify_init1
inotify_rm_watch
ioctl
lseek
lstat
madvise
mkdir
mkdirat
mmap
mprotect
mremap
munmap
nanosleep
newfstatat
open
openat
pipe
pipe2
poll
ppoll
prctl
pread64
prlimit64
pselect6
pwrite64
read
readlink
readlinkat
readv
rename
renameat
restart_syscall
rmdir
rt_sigaction
rt_sigpending
rt_sigprocmask
rt_sigqueueinfo
rt_sigreturn
rt_sigsuspend
rt_sigtimedwait
sched_getaffinity
sched_yield
select
set_robust_list
set_tid_address
sigaltstack
stat
statfs
sysinfo
tgkill
time
umask
uname
unlink
unlinkat
wait4
waitid
write
writev
";

/// Classic snaps are not syscall-filtered.
pub const SECCOMP_CLASSIC: &str = "\
# Classic confinement
@unrestricted
";

pub const APPARMOR_DEFAULT: &str = "\
#include <tunables/global>

###VAR###

###PROFILEATTACH### ###FLAGS### {
  #include <abstractions/base>
  #include <abstractions/consoles>
  #include <abstractions/openssl>

  /etc/ld.so.cache r,
  /etc/ld.so.preload r,
  /{,usr/}lib{,32,64,x32}/{,@{multiarch}/}ld{-*,64}.so* mrix,
  /{,usr/}bin/{,ba,da}sh ixr,
  /{,usr/}bin/{cat,cp,ls,mkdir,mv,rm,sleep,tr} ixr,

  /dev/{,u}random r,
  /dev/null rw,
  /dev/zero rw,
  /dev/full rw,
  owner /dev/shm/snap.@{SNAP_NAME}.** mrwlkix,

  @{PROC}/@{pid}/{stat,statm,cmdline,environ} r,
  @{PROC}/sys/kernel/hostname r,
  @{PROC}/sys/vm/overcommit_memory r,

  @{INSTALL_DIR}/@{SNAP_NAME}/                   r,
  @{INSTALL_DIR}/@{SNAP_NAME}/@{SNAP_REVISION}/  r,
  @{INSTALL_DIR}/@{SNAP_NAME}/@{SNAP_REVISION}/** mrklix,

  owner @{HOME}/snap/@{SNAP_NAME}/@{SNAP_REVISION}/** wl,
  owner /var/snap/@{SNAP_NAME}/@{SNAP_REVISION}/** wl,
  owner /tmp/snap.@{SNAP_NAME}/** rwkl,

###SNIPPETS###}
";

pub const APPARMOR_CLASSIC: &str = "\
#include <tunables/global>

###VAR###

###PROFILEATTACH### ###FLAGS### {
  # Classic snaps run with the host's privileges.
  capability,
  network,
  unix,
  ptrace,
  signal,
  mount,
  umount,
  pivot_root,
  dbus,
  file,
  /** rwlkmix,

###SNIPPETS###}
";
